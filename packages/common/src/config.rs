use serde::Deserialize;

use crate::upload::DEFAULT_URL_TTL;

/// Object storage connection settings.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// S3 endpoint. Default: "http://localhost:9000".
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Default: "us-east-1".
    #[serde(default = "default_region")]
    pub region: String,
    /// Default: "linkdrop".
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    /// Address the bucket as a path segment rather than a subdomain.
    /// Required by most self-hosted S3 services. Default: true.
    #[serde(default = "default_path_style")]
    pub path_style: bool,
    /// Lifetime of presigned upload and download URLs. Default: 1800.
    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:9000".into()
}
fn default_region() -> String {
    "us-east-1".into()
}
fn default_bucket() -> String {
    "linkdrop".into()
}
fn default_path_style() -> bool {
    true
}
fn default_url_ttl_secs() -> u64 {
    DEFAULT_URL_TTL.as_secs()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            region: default_region(),
            bucket: default_bucket(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            path_style: default_path_style(),
            url_ttl_secs: default_url_ttl_secs(),
        }
    }
}

//! Field validators shared by the store, the upload orchestrator and the HTTP layer.

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, percent_encode};
use thiserror::Error;
use url::Url;
use uuid::{Uuid, Version};

use crate::password;
use crate::resource::{Entry, Payload, Resource};
use crate::upload::MAX_FILE_SIZE;

pub const MAX_RAW_SLUG_LEN: usize = 255;
/// Every raw byte may expand to a three-byte escape.
pub const MAX_SLUG_LEN: usize = MAX_RAW_SLUG_LEN * 3;
pub const MAX_PASSWORD_LEN: usize = 255;
pub const MAX_TARGET_URL_LEN: usize = 2000;
pub const MAX_FILENAME_LEN: usize = 255;
pub const MAX_MIME_TYPE_LEN: usize = 127;

/// Bytes escaped inside a single path segment. Unreserved characters and
/// `$ & + : = @` pass through.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

const FORBIDDEN_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid slug: {0}")]
    Slug(&'static str),

    #[error("Invalid password: {0}")]
    Password(&'static str),

    #[error("Invalid password hash: {0}")]
    PasswordHash(&'static str),

    #[error("Invalid target URL: {0}")]
    TargetUrl(&'static str),

    #[error("Invalid file UUID: {0}")]
    FileUuid(&'static str),

    #[error("Invalid filename: {0}")]
    Filename(&'static str),

    #[error("Invalid MIME type: {0}")]
    MimeType(&'static str),

    #[error("Invalid file size: {0}")]
    Size(&'static str),

    #[error("Invalid expiration: {0}")]
    ExpiresAt(&'static str),

    #[error("Invalid resource: {0}")]
    Resource(String),

    #[error("Invalid upload parts: {0}")]
    Parts(String),
}

/// Raw slug as typed by a user: letters, ASCII digits, `_` and `-`.
pub fn validate_raw_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(ValidationError::Slug("slug cannot be empty"));
    }
    if slug.len() > MAX_RAW_SLUG_LEN {
        return Err(ValidationError::Slug("slug exceeds 255 bytes"));
    }
    let allowed = |c: char| c.is_alphabetic() || c.is_ascii_digit() || c == '_' || c == '-';
    if !slug.chars().all(allowed) {
        return Err(ValidationError::Slug(
            "only letters, digits, '_' and '-' are allowed",
        ));
    }
    Ok(())
}

/// Path-escape a raw slug into its stored form.
pub fn canonical_slug(raw: &str) -> String {
    percent_encode(raw.as_bytes(), PATH_SEGMENT).to_string()
}

/// A stored slug must survive unescape-then-escape unchanged.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(ValidationError::Slug("slug cannot be empty"));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(ValidationError::Slug("slug exceeds 765 bytes"));
    }
    let decoded: Vec<u8> = percent_decode_str(slug).collect();
    if percent_encode(&decoded, PATH_SEGMENT).to_string() != slug {
        return Err(ValidationError::Slug("slug is not in canonical escaped form"));
    }
    Ok(())
}

pub fn validate_raw_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Password("password cannot be empty"));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(ValidationError::Password("password exceeds 255 bytes"));
    }
    let allowed =
        |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '!' | '?' | ' ' | '-');
    if !password.chars().all(allowed) {
        return Err(ValidationError::Password(
            "only ASCII letters, digits, spaces and '_', '!', '?', '-' are allowed",
        ));
    }
    Ok(())
}

pub fn validate_password_hash(hash: &str) -> Result<(), ValidationError> {
    if hash.is_empty() {
        return Err(ValidationError::PasswordHash("hash cannot be empty"));
    }
    password::check_hash_format(hash)
}

pub fn validate_target_url(target: &str) -> Result<(), ValidationError> {
    if target.is_empty() {
        return Err(ValidationError::TargetUrl("URL cannot be empty"));
    }
    if target.len() > MAX_TARGET_URL_LEN {
        return Err(ValidationError::TargetUrl("URL exceeds 2000 bytes"));
    }
    let url = Url::parse(target).map_err(|_| ValidationError::TargetUrl("URL is not absolute"))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::TargetUrl("URL has no host"));
    }
    Ok(())
}

pub fn validate_file_uuid(uuid: &Uuid) -> Result<(), ValidationError> {
    match uuid.get_version() {
        Some(Version::Random) => Ok(()),
        _ => Err(ValidationError::FileUuid("UUID must be version 4")),
    }
}

pub fn parse_file_uuid(raw: &str) -> Result<Uuid, ValidationError> {
    let uuid = Uuid::parse_str(raw).map_err(|_| ValidationError::FileUuid("not a UUID"))?;
    validate_file_uuid(&uuid)?;
    Ok(uuid)
}

/// A single path component without reserved or invisible characters.
pub fn validate_filename(filename: &str) -> Result<(), ValidationError> {
    if filename.is_empty() {
        return Err(ValidationError::Filename("filename cannot be empty"));
    }
    if filename.len() > MAX_FILENAME_LEN {
        return Err(ValidationError::Filename("filename exceeds 255 bytes"));
    }
    if filename == "." {
        return Err(ValidationError::Filename("'.' is not a filename"));
    }
    if filename.contains("..") {
        return Err(ValidationError::Filename("'..' is not allowed"));
    }
    if filename.contains(FORBIDDEN_FILENAME_CHARS) {
        return Err(ValidationError::Filename(
            "characters <>:\"/\\|?* are not allowed",
        ));
    }
    if filename.chars().any(|c| c.is_control() || is_format_char(c)) {
        return Err(ValidationError::Filename(
            "control characters are not allowed",
        ));
    }
    Ok(())
}

// Zero-width and bidi overrides.
fn is_format_char(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
    )
}

/// `type/subtype`, both halves non-empty.
pub fn validate_mime_type(mime: &str) -> Result<(), ValidationError> {
    if mime.is_empty() {
        return Err(ValidationError::MimeType("MIME type cannot be empty"));
    }
    if mime.len() > MAX_MIME_TYPE_LEN {
        return Err(ValidationError::MimeType("MIME type exceeds 127 bytes"));
    }
    match mime.split_once('/') {
        Some((kind, subtype)) if !kind.is_empty() && !subtype.is_empty() => Ok(()),
        _ => Err(ValidationError::MimeType("expected type/subtype")),
    }
}

pub fn validate_size(size: i64) -> Result<(), ValidationError> {
    if size <= 0 {
        return Err(ValidationError::Size("size must be positive"));
    }
    if size > MAX_FILE_SIZE {
        return Err(ValidationError::Size("size exceeds 10 GiB"));
    }
    Ok(())
}

pub fn validate_expires_at(
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if expires_at <= now {
        return Err(ValidationError::ExpiresAt("expiration must be in the future"));
    }
    Ok(())
}

/// Checks stored-form entry fields. Expiry is a request-time concern and is
/// not checked here.
pub fn validate_entry(entry: &Entry) -> Result<(), ValidationError> {
    validate_slug(&entry.slug)?;
    if let Some(hash) = &entry.password_hash {
        validate_password_hash(hash)?;
    }
    Ok(())
}

pub fn validate_resource(resource: &Resource) -> Result<(), ValidationError> {
    validate_entry(&resource.entry)?;
    if resource.payload.entry_id() != resource.entry.id {
        return Err(ValidationError::Resource(format!(
            "payload belongs to entry {}, not {}",
            resource.payload.entry_id(),
            resource.entry.id
        )));
    }
    match &resource.payload {
        Payload::Link(link) => validate_target_url(&link.target_url),
        Payload::File(file) => {
            validate_file_uuid(&file.file_uuid)?;
            validate_filename(&file.filename)?;
            validate_mime_type(&file.mime_type)?;
            validate_size(file.size)
        }
    }
}

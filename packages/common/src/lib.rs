pub mod config;
pub mod password;
pub mod resource;
pub mod storage;
pub mod upload;
pub mod validate;

pub use resource::{Entry, File, Link, Payload, Resource, ResourceType};
pub use upload::{CompletedPart, PartUpload, UploadPlan};
pub use validate::ValidationError;

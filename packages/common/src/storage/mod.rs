mod error;
mod traits;

#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use traits::{ObjectHead, ObjectStorage, object_key};

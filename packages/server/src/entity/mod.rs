pub mod entry;
pub mod file;
pub mod link;

pub mod admin;
pub mod file;
pub mod link;
pub mod public;

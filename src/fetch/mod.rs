pub mod error;
pub mod fetcher;
pub mod json_path;
pub mod source;

pub mod error;
pub mod log_store;

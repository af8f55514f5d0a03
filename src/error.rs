use crate::config::ConfigError;
use crate::fetch::error::FetchError;
use crate::store::error::LogStoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeteologError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] LogStoreError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

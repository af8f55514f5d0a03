use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("Failed to create directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read log file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse log file '{0}'")]
    CsvRead(PathBuf, #[source] csv::Error),

    #[error("Log file '{path}' does not start with the expected header (found {found:?})")]
    HeaderMismatch { path: PathBuf, found: Vec<String> },

    #[error("Failed to create temporary file next to '{0}'")]
    TempFile(PathBuf, #[source] std::io::Error),

    #[error("Failed to write log data for '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode log data for '{0}'")]
    CsvWrite(PathBuf, #[source] csv::Error),

    #[error("Failed to move temporary file onto '{0}'")]
    Persist(PathBuf, #[source] std::io::Error),
}

impl LogStoreError {
    /// True when the file exists but isn't a log this store can use.
    pub fn is_header_mismatch(&self) -> bool {
        matches!(self, LogStoreError::HeaderMismatch { .. })
    }
}

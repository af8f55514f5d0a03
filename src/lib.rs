mod config;
mod error;
mod fetch;
mod pipeline;
mod store;
mod trim;
mod types;

pub use config::{Config, ConfigError, FetchSettings, PartialPolicy};
pub use error::MeteologError;
pub use pipeline::{CycleOutcome, CycleReport, Pipeline};

pub use fetch::error::FetchError;
pub use fetch::fetcher::Fetcher;
pub use fetch::json_path::JsonPath;
pub use fetch::source::{DataSource, ReadingSource};

pub use store::error::LogStoreError;
pub use store::log_store::{LogStore, StagedWrite};

pub use trim::{trim, RetentionPolicy};

pub use types::clock::{parse_timestamp, LogClock, UnknownZoneError};
pub use types::reading::{ParseReadingError, Reading, UNAVAILABLE};
pub use types::record::{Header, Record};

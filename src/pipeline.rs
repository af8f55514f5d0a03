//! One fetch → dedup → append → trim cycle over the log file.

use crate::config::{Config, PartialPolicy};
use crate::error::MeteologError;
use crate::fetch::fetcher::Fetcher;
use crate::fetch::source::{DataSource, ReadingSource};
use crate::store::log_store::LogStore;
use crate::trim::{trim, RetentionPolicy};
use crate::types::clock::LogClock;
use crate::types::record::Record;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::fmt;
use std::time::Duration;
use tokio::task;

/// What a cycle did with the freshly fetched readings.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Logged(Record),
    /// Readings were textually identical to the last stored row.
    SkippedDuplicate,
    /// A reading was unavailable and the deployment skips partial rows.
    SkippedInvalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Records in the file after the cycle.
    pub kept: usize,
    /// Records removed by the retention policy this cycle.
    pub removed: usize,
    /// The file was unreadable or had a foreign header and was rewritten from scratch.
    pub reset: bool,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            CycleOutcome::Logged(r) => write!(
                f,
                "Logged [{}, {}, {}]",
                r.timestamp, r.first, r.second
            )?,
            CycleOutcome::SkippedDuplicate => f.write_str("No change, skipped")?,
            CycleOutcome::SkippedInvalid => f.write_str("Incomplete readings, skipped")?,
        }
        if self.reset {
            f.write_str("; log was reset")?;
        }
        if self.removed > 0 {
            write!(f, "; trimmed {} rows", self.removed)?;
        }
        write!(f, "; {} rows kept", self.kept)
    }
}

enum Persist {
    Replace(Vec<Record>),
    Append(Record),
    Nothing,
}

pub struct Pipeline<S> {
    store: LogStore,
    clock: LogClock,
    first: DataSource,
    second: DataSource,
    retention: RetentionPolicy,
    on_partial: PartialPolicy,
    source: S,
}

impl Pipeline<Fetcher> {
    /// Builds a pipeline that reads both sources over HTTP.
    pub fn from_config(config: &Config) -> Result<Self, MeteologError> {
        let fetcher = config.fetcher()?;
        Self::new(config, fetcher)
    }
}

impl<S: ReadingSource + Sync> Pipeline<S> {
    pub fn new(config: &Config, source: S) -> Result<Self, MeteologError> {
        config.validate()?;
        Ok(Self {
            store: config.store(),
            clock: config.clock()?,
            first: config.first.clone(),
            second: config.second.clone(),
            retention: config.retention,
            on_partial: config.on_partial,
            source,
        })
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Runs a single cycle, stamping a new row with `now`.
    ///
    /// Fetch failures never fail the cycle; they become `N/A` readings. An
    /// unreadable log is replaced by a fresh one. Only failing to create or
    /// write the log is an error.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<CycleReport, MeteologError> {
        let store = self.store.clone();
        task::spawn_blocking(move || store.ensure_initialized()).await??;

        let first = self.source.read(&self.first).await;
        let second = self.source.read(&self.second).await;

        let store = self.store.clone();
        let (mut records, reset) = match task::spawn_blocking(move || store.read_all()).await? {
            Ok(records) => (records, false),
            Err(e) => {
                warn!("{}. Resetting to header only", e);
                (Vec::new(), true)
            }
        };

        let outcome = if self.on_partial == PartialPolicy::Skip
            && !(first.is_available() && second.is_available())
        {
            CycleOutcome::SkippedInvalid
        } else {
            let record = Record::new(self.clock.timestamp(now), first, second);
            if records.last().is_some_and(|last| last.same_readings(&record)) {
                CycleOutcome::SkippedDuplicate
            } else {
                records.push(record.clone());
                CycleOutcome::Logged(record)
            }
        };

        let kept = trim(&records, &self.retention, now);
        let removed = records.len() - kept.len();
        let report = CycleReport {
            outcome,
            kept: kept.len(),
            removed,
            reset,
        };

        let persist = if reset || removed > 0 {
            Persist::Replace(kept)
        } else if let CycleOutcome::Logged(record) = &report.outcome {
            Persist::Append(record.clone())
        } else {
            Persist::Nothing
        };
        let store = self.store.clone();
        task::spawn_blocking(move || match persist {
            Persist::Replace(kept) => store.replace_all(&kept),
            Persist::Append(record) => store.append_one(&record),
            Persist::Nothing => Ok(()),
        })
        .await??;

        info!("{}", report);
        Ok(report)
    }

    /// Runs a cycle every `interval` until the process is stopped. Failed
    /// cycles are logged and the loop carries on.
    pub async fn run_forever(&self, interval: Duration) {
        info!(
            "Logging to {} every {:?}, keeping {}",
            self.store.path().display(),
            interval,
            self.retention
        );
        loop {
            if let Err(e) = self.run_once(Utc::now()).await {
                error!("Cycle failed: {}", e);
            }
            tokio::time::sleep(interval).await;
        }
    }
}

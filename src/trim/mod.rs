//! Retention policies applied to the log after each cycle.

use crate::types::clock::parse_timestamp;
use crate::types::record::Record;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which records survive a trim pass.
///
/// # Examples
///
/// ```
/// use meteolog::RetentionPolicy;
///
/// let policy: RetentionPolicy = toml::from_str(r#"kind = "max_rows"
/// rows = 500"#).unwrap();
/// assert_eq!(policy, RetentionPolicy::MaxRows { rows: 500 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep records strictly newer than `now - days`. Records whose timestamp
    /// can't be parsed are dropped. A window reaching past the earliest
    /// representable date keeps every parsable record.
    MaxAge { days: u32 },
    /// Keep the most recently appended `rows` records.
    MaxRows { rows: usize },
    KeepAll,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        RetentionPolicy::MaxAge { days: 7 }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionPolicy::MaxAge { days } => write!(f, "last {} days", days),
            RetentionPolicy::MaxRows { rows } => write!(f, "last {} rows", rows),
            RetentionPolicy::KeepAll => f.write_str("everything"),
        }
    }
}

/// Returns the records `policy` keeps, in their original order.
pub fn trim(records: &[Record], policy: &RetentionPolicy, now: DateTime<Utc>) -> Vec<Record> {
    match *policy {
        RetentionPolicy::MaxAge { days } => {
            let cutoff =
                Duration::try_days(i64::from(days)).and_then(|d| now.checked_sub_signed(d));
            records
                .iter()
                .filter(|r| {
                    parse_timestamp(&r.timestamp)
                        .is_some_and(|ts| cutoff.map_or(true, |cutoff| ts > cutoff))
                })
                .cloned()
                .collect()
        }
        RetentionPolicy::MaxRows { rows } => {
            let skip = records.len().saturating_sub(rows);
            records[skip..].to_vec()
        }
        RetentionPolicy::KeepAll => records.to_vec(),
    }
}

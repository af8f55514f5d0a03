use crate::types::reading::Reading;
use serde::{Deserialize, Serialize};

/// The three column labels of the log file.
///
/// The first line of the file must match these exactly, otherwise the file
/// is considered invalid and is reset to just this header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub timestamp: String,
    pub first: String,
    pub second: String,
}

impl Header {
    pub fn new(
        timestamp: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn columns(&self) -> [&str; 3] {
        [&self.timestamp, &self.first, &self.second]
    }

    /// Whether `row` is exactly this header, label for label.
    pub(crate) fn matches<'a>(&self, row: impl IntoIterator<Item = &'a str>) -> bool {
        row.into_iter().eq(self.columns())
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new("Timestamp", "Temperature (°C)", "Bitcoin Price (USD)")
    }
}

/// One row of the log: capture time plus one reading per data source.
///
/// The timestamp is kept as the exact text that was written so that rows are
/// rewritten byte-for-byte on trim; it is only parsed when the age-based
/// retention policy needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: String,
    pub first: Reading,
    pub second: Reading,
}

impl Record {
    pub fn new(timestamp: impl Into<String>, first: Reading, second: Reading) -> Self {
        Self {
            timestamp: timestamp.into(),
            first,
            second,
        }
    }

    /// True when both readings render to the same text as `other`'s.
    pub fn same_readings(&self, other: &Record) -> bool {
        self.first.to_string() == other.first.to_string()
            && self.second.to_string() == other.second.to_string()
    }

    pub(crate) fn to_row(&self) -> [String; 3] {
        [
            self.timestamp.clone(),
            self.first.to_string(),
            self.second.to_string(),
        ]
    }

    /// Parses a CSV row, returning `None` for anything that isn't exactly three
    /// fields with two readable values.
    pub(crate) fn from_row(row: &csv::StringRecord) -> Option<Self> {
        if row.len() != 3 {
            return None;
        }
        let timestamp = row.get(0)?.trim();
        if timestamp.is_empty() {
            return None;
        }
        let first = row.get(1)?.parse().ok()?;
        let second = row.get(2)?.parse().ok()?;
        Some(Self::new(timestamp, first, second))
    }
}

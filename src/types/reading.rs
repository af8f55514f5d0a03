//! A single numeric reading as stored in one column of the log.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Text written in place of a reading whose fetch failed.
pub const UNAVAILABLE: &str = "N/A";

/// One column value of a [`crate::Record`].
///
/// Either a numeric value from a provider or the explicit [`UNAVAILABLE`]
/// sentinel, which is what gets stored when the corresponding fetch failed or
/// returned something that could not be read as a number.
///
/// # Examples
///
/// ```
/// use meteolog::Reading;
///
/// assert_eq!(Reading::Value(21.5).to_string(), "21.5");
/// assert_eq!(Reading::Unavailable.to_string(), "N/A");
/// assert_eq!("67000.12".parse::<Reading>().unwrap(), Reading::Value(67000.12));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f64),
    Unavailable,
}

impl Reading {
    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Value(_))
    }
}

impl From<Option<f64>> for Reading {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Reading::Value(v),
            _ => Reading::Unavailable,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{}", v),
            Reading::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("'{0}' is neither a number nor 'N/A'")]
pub struct ParseReadingError(pub String);

impl FromStr for Reading {
    type Err = ParseReadingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == UNAVAILABLE {
            return Ok(Reading::Unavailable);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Reading::Value(v)),
            _ => Err(ParseReadingError(s.to_string())),
        }
    }
}

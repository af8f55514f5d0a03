use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A dot-separated key path into a JSON document, e.g. `current.temperature_2m`.
///
/// Segments that are plain integers also index into arrays, so `data.0.price`
/// reads the `price` of the first element of `data`.
///
/// # Examples
///
/// ```
/// use meteolog::JsonPath;
/// use serde_json::json;
///
/// let path = JsonPath::from("bitcoin.usd");
/// let body = json!({ "bitcoin": { "usd": 67000.12 } });
/// assert_eq!(path.number(&body), Some(67000.12));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct JsonPath {
    segments: Vec<String>,
}

impl JsonPath {
    pub fn lookup<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.segments.iter().try_fold(root, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Reads the value at this path as a finite number. Numeric strings such
    /// as `"67000.12"` are accepted since some price APIs quote as text.
    pub fn number(&self, root: &Value) -> Option<f64> {
        let value = match self.lookup(root)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        value.is_finite().then_some(value)
    }
}

impl From<&str> for JsonPath {
    fn from(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

impl From<String> for JsonPath {
    fn from(path: String) -> Self {
        JsonPath::from(path.as_str())
    }
}

impl From<JsonPath> for String {
    fn from(path: JsonPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

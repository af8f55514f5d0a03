use crate::fetch::error::FetchError;
use crate::fetch::json_path::JsonPath;
use crate::types::reading::Reading;
use serde::{Deserialize, Serialize};
use std::future::Future;

const API_KEY_PLACEHOLDER: &str = "{api_key}";

/// One JSON endpoint and where in its response the reading lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSource {
    /// Human-readable name, used in log lines.
    pub label: String,
    pub url: String,
    pub path: JsonPath,
    /// Name of an environment variable whose value replaces `{api_key}` in `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl DataSource {
    pub fn new(label: impl Into<String>, url: impl Into<String>, path: impl Into<JsonPath>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            path: path.into(),
            api_key_env: None,
        }
    }

    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }

    /// Current temperature from open-meteo for the given coordinates.
    pub fn open_meteo_temperature(latitude: f64, longitude: f64) -> Self {
        Self::new(
            "temperature",
            format!(
                "https://api.open-meteo.com/v1/forecast?latitude={latitude}&longitude={longitude}&current=temperature_2m"
            ),
            "current.temperature_2m",
        )
    }

    /// Spot price of a coin from CoinGecko's simple price endpoint.
    pub fn coingecko_price(coin: &str, currency: &str) -> Self {
        Self::new(
            format!("{coin} price"),
            format!("https://api.coingecko.com/api/v3/simple/price?ids={coin}&vs_currencies={currency}"),
            format!("{coin}.{currency}"),
        )
    }

    /// Current temperature from OpenWeatherMap; needs an API key in `key_env`.
    pub fn openweathermap_temperature(city: &str, key_env: &str) -> Self {
        Self::new(
            "temperature",
            format!(
                "https://api.openweathermap.org/data/2.5/weather?q={city}&appid={API_KEY_PLACEHOLDER}&units=metric"
            ),
            "main.temp",
        )
        .with_api_key_env(key_env)
    }

    /// The URL to request, with the API key substituted in when one is configured.
    pub fn resolve_url(&self) -> Result<String, FetchError> {
        match &self.api_key_env {
            None => Ok(self.url.clone()),
            Some(var) => {
                let key = std::env::var(var)
                    .ok()
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| FetchError::MissingApiKey(var.clone()))?;
                Ok(self.url.replace(API_KEY_PLACEHOLDER, &key))
            }
        }
    }
}

/// Something that can produce a reading for a [`DataSource`].
///
/// Implementations never fail: anything that goes wrong is reported as
/// [`Reading::Unavailable`].
pub trait ReadingSource {
    fn read(&self, source: &DataSource) -> impl Future<Output = Reading> + Send;
}

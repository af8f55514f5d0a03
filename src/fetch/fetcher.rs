use crate::fetch::error::FetchError;
use crate::fetch::source::{DataSource, ReadingSource};
use crate::types::reading::Reading;
use bon::bon;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// HTTP GET with a bounded number of attempts and a fixed pause between them.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

#[bon]
impl Fetcher {
    /// Creates a fetcher.
    ///
    /// * `.timeout(Duration)`: per-request timeout. Defaults to 10 seconds.
    /// * `.max_attempts(u32)`: total attempts per URL, at least 1. Defaults to 3.
    /// * `.retry_delay(Duration)`: pause between attempts. Defaults to 3 seconds.
    #[builder]
    pub fn new(
        timeout: Option<Duration>,
        max_attempts: Option<u32>,
        retry_delay: Option<Duration>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(FetchError::ClientBuild)?;
        Ok(Self {
            client,
            max_attempts: max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS).max(1),
            retry_delay: retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
        })
    }
}

impl Fetcher {
    /// GETs `url` and parses the body as JSON, retrying network errors,
    /// non-2xx statuses and unparsable bodies. Returns the last error once
    /// all attempts are used up.
    pub async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let mut attempt = 1;
        loop {
            match self.get_json(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.max_attempts => {
                    warn!(
                        "Attempt {}/{} for {} failed: {}. Retrying in {:?}",
                        attempt, self.max_attempts, url, e, self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetches `source` and extracts its reading. Extraction failures are not
    /// retried; a body without the expected key won't grow one on a second try.
    pub async fn fetch(&self, source: &DataSource) -> Result<f64, FetchError> {
        let url = source.resolve_url()?;
        let body = self.fetch_json(&url).await?;
        let path = source.path.to_string();
        match source.path.lookup(&body) {
            None => Err(FetchError::MissingKey { url, path }),
            Some(found) => source
                .path
                .number(&body)
                .ok_or_else(|| FetchError::NotNumeric {
                    url,
                    path,
                    found: found.to_string(),
                }),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!("Requesting {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::JsonParse(url.to_string(), e))
    }
}

impl ReadingSource for Fetcher {
    async fn read(&self, source: &DataSource) -> Reading {
        match self.fetch(source).await {
            Ok(value) => {
                debug!("{} = {}", source.label, value);
                Reading::Value(value)
            }
            Err(e) => {
                warn!("{} unavailable: {}", source.label, e);
                Reading::Unavailable
            }
        }
    }
}

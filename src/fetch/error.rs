use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Response from {0} is not valid JSON")]
    JsonParse(String, #[source] reqwest::Error),

    #[error("Key path '{path}' not found in response from {url}")]
    MissingKey { url: String, path: String },

    #[error("Value at '{path}' in response from {url} is not a number: {found}")]
    NotNumeric {
        url: String,
        path: String,
        found: String,
    },

    #[error("Environment variable '{0}' holding the API key is not set")]
    MissingApiKey(String),
}

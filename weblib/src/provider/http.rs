//! HTTP client abstraction for testability.

use std::time::Duration;

use thiserror::Error;

use crate::host::BoxFuture;

/// Default request timeout for catalog and content fetches.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the HTTP layer, before they are mapped to provider errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The request never produced a response (connect failure, timeout).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

impl HttpError {
    /// Whether this error is a 404, i.e. the resource does not exist rather
    /// than the provider being unreachable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HttpError::Status { status: 404, .. })
    }
}

/// Trait for HTTP GET operations.
///
/// This abstraction allows dependency injection and easier testing by
/// enabling mock HTTP clients in provider tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request, returning the response body.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, HttpError>>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new client with the default timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Transport {
                url: String::new(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, HttpError>> {
        Box::pin(async move {
            let response =
                self.client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| HttpError::Transport {
                        url: url.to_string(),
                        message: e.to_string(),
                    })?;

            let status = response.status();
            if !status.is_success() {
                return Err(HttpError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| HttpError::Transport {
                    url: url.to_string(),
                    message: format!("failed to read response: {}", e),
                })
        })
    }
}

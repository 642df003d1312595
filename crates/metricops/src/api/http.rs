//! HTTPS transport with basic authentication.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;

use super::error::{parse_field_errors, ApiError, Result};
use super::transport::{ApiRequest, Method, Transport};

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "https://metrics-api.librato.com/v1";

/// Default connect timeout for HTTP requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout for HTTP requests (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of retries for transient failures of idempotent requests.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// First retry delay; doubles with every attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Maximum length of a response body quoted in an error.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Connection settings for [`HttpTransport`].
#[derive(Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub email: String,
    pub token: SecretString,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Clone for ClientConfig {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            email: self.email.clone(),
            token: SecretString::from(self.token.expose_secret().to_string()),
            timeout: self.timeout,
            max_retries: self.max_retries,
        }
    }
}

impl ClientConfig {
    pub fn new(email: impl Into<String>, token: SecretString) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            email: email.into(),
            token,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// The production [`Transport`]: JSON over HTTPS.
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(config.timeout)
            .user_agent(concat!("metricops/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<Option<Value>> {
        let url = self.url(&request.path);
        log::debug!("{} {}", request.method, url);

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, &url)
            .basic_auth(&self.config.email, Some(self.config.token.expose_secret()));
        if !request.query.is_empty() {
            builder = builder.query(request.query.pairs());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        log::trace!("{} {} -> {}", request.method, url, status);
        interpret_response(status, &request.path, &text)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    /// Sends `request`, retrying transient failures with exponential backoff.
    ///
    /// `POST` is never retried: a create that timed out may still have landed.
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>> {
        let max_retries = match request.method {
            Method::Post => 0,
            _ => self.config.max_retries,
        };

        let mut attempt = 0;
        loop {
            match self.send_once(&request).await {
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let delay = retry_delay(attempt);
                    attempt += 1;
                    log::warn!(
                        "{} {} failed ({}), retrying in {:?} (attempt {}/{})",
                        request.method,
                        request.path,
                        e,
                        delay,
                        attempt + 1,
                        max_retries + 1
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

/// 500ms, 1s, 2s, ...
fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY * 2u32.saturating_pow(attempt)
}

/// Maps a status code and body to the transport contract.
pub(crate) fn interpret_response(status: u16, path: &str, body: &str) -> Result<Option<Value>> {
    match status {
        200..=299 => {
            if body.trim().is_empty() {
                return Ok(None);
            }
            serde_json::from_str(body)
                .map(Some)
                .map_err(|e| ApiError::Decode(e.to_string()))
        }
        404 => Err(ApiError::NotFound {
            path: path.to_string(),
        }),
        400 | 422 => {
            let errors = serde_json::from_str::<Value>(body)
                .map(|parsed| parse_field_errors(&parsed))
                .unwrap_or_default();
            if errors.is_empty() {
                return Err(ApiError::Status {
                    status,
                    body: truncate(body),
                });
            }
            Err(ApiError::Validation { status, errors })
        }
        _ => Err(ApiError::Status {
            status,
            body: truncate(body),
        }),
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &body[..end])
}

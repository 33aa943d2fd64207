//! Transport Layer for the Repository Client
//!
//! Abstracts the HTTP connection for testability. Provides:
//! - Transport trait: interface for REST calls
//! - MockTransport: in-process mock repository manager for tests
//! - HttpTransport: blocking HTTP client for production

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::mock::MockRepositoryManager;

use super::api::{ApiRequest, ApiResponse, Method};

/// Transport trait for repository manager calls
pub trait Transport: Send + Sync {
    /// Execute a request and return the response, whatever its status
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::ConnectionFailed(e.to_string())
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

/// Mock transport for testing - calls a MockRepositoryManager in-process
pub struct MockTransport {
    manager: MockRepositoryManager,
}

impl MockTransport {
    /// Create a new mock transport with an empty repository manager
    pub fn new() -> Self {
        Self {
            manager: MockRepositoryManager::new(),
        }
    }

    /// Create a mock transport around a pre-seeded repository manager
    pub fn with_manager(manager: MockRepositoryManager) -> Self {
        Self { manager }
    }

    /// Get the underlying manager for test setup and assertions
    pub fn manager(&self) -> &MockRepositoryManager {
        &self.manager
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.manager.handle_request(request)
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// API base URL, e.g. `http://indy.example.com/api/`
    pub base_url: Url,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Bearer token sent with every request
    pub auth_token: Option<String>,
}

impl HttpConfig {
    /// Parse a base URL, making sure relative routes join beneath it
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            request_timeout,
            auth_token: None,
        })
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }
}

/// Parse `raw` and ensure it ends with `/`
pub fn normalize_base_url(raw: &str) -> Result<Url, TransportError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TransportError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            raw, other
        ))),
    }
}

/// Blocking HTTP transport for production use
pub struct HttpTransport {
    config: HttpConfig,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self
            .config
            .base_url
            .join(&request.path)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", request.path, e)))?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Delete => self.client.delete(url),
        };
        builder = builder.header("X-Request-Id", &request.request_id);
        if let Some(ref token) = self.config.auth_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let text = response.text()?;

        // Error pages are often not JSON; keep them as a plain string body.
        let body = if text.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
        };

        Ok(ApiResponse { status, body })
    }
}

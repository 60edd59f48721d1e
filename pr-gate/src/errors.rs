//! Crate-wide error hierarchy for pr-gate.
//!
//! Goals:
//! - Single root `Error` for all public functions.
//! - Provider-aware mapping (401→Unauthorized, 429→RateLimited, 5xx→Server, etc.).
//! - No dynamic dispatch, no async-trait, ergonomic `?` via `From` impls.
//!
//! LLM contract violations never appear here: the orchestrator recovers them
//! locally with fixed fallback values and nothing propagates.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type GateResult<T> = Result<T, Error>;

/// Root error type for the pr-gate crate.
#[derive(Debug, Error)]
pub enum Error {
    /// App credential / installation-token failure.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// GitHub API related failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Review-record store (file I/O / JSON) failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Input validation errors (bad payload shapes, missing fields).
    #[error("validation error: {0}")]
    Validation(String),
}

/// Credential-layer errors: JWT signing and the installation-token exchange.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The configured private key could not be parsed as RSA PEM.
    #[error("malformed signing key: {0}")]
    BadKey(#[source] jsonwebtoken::errors::Error),

    /// JWT encoding failed.
    #[error("jwt encoding failed: {0}")]
    Jwt(#[source] jsonwebtoken::errors::Error),

    /// Token exchange returned a non-success status.
    #[error("token exchange failed: status {status}: {snippet}")]
    Exchange { status: u16, snippet: String },

    /// Exchange response had an unexpected shape.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// Network/transport failure during the exchange.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Detailed provider-specific error used inside the GitHub client layer.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Gateway/Server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status (4xx/3xx) not covered above.
    #[error("http status error: {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// JSON deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Unexpected/invalid shape of provider response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Review-record store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

// ===== Conversions for `?` ergonomics =====

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Provider(ProviderError::from(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Store(StoreError::Io(e))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ProviderError::Timeout;
        }
        if let Some(status) = e.status() {
            let code = status.as_u16();
            return match code {
                401 => ProviderError::Unauthorized,
                403 => ProviderError::Forbidden,
                404 => ProviderError::NotFound,
                429 => ProviderError::RateLimited {
                    retry_after_secs: None,
                },
                500..=599 => ProviderError::Server(code),
                _ => ProviderError::HttpStatus(code),
            };
        }
        ProviderError::Network(e.to_string())
    }
}

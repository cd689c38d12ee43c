//! Error types for Parley.

pub mod classify;

pub use classify::{classify_message, ErrorKind, TurnError};

use thiserror::Error;

use crate::config::ConfigField;

/// Primary error type for all Parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("Configuration incomplete: {} must not be empty", join_fields(.missing))]
    ConfigIncomplete { missing: Vec<ConfigField> },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Max turns ({0}) exceeded")]
    MaxTurnsExceeded(usize),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("{0}")]
    Turn(TurnError),
}

impl ParleyError {
    /// Create an API error from an HTTP status and response body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into the user-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigIncomplete { .. } => ErrorKind::ConfigIncomplete,
            Self::Authentication(_) => ErrorKind::InvalidCredential,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::MissingCredential(_) => ErrorKind::MissingCredential,
            Self::ModelNotFound(_) => ErrorKind::EndpointNotFound,
            Self::Network(e) if e.is_timeout() => ErrorKind::Timeout,
            Self::Network(e) if e.is_connect() || e.is_request() => ErrorKind::NetworkError,
            Self::Network(e) => match e.status().map(|s| s.as_u16()) {
                Some(status) => ErrorKind::from_status(status)
                    .unwrap_or_else(|| classify_message(&e.to_string())),
                None => ErrorKind::NetworkError,
            },
            Self::Api { status, message } => {
                ErrorKind::from_status(*status).unwrap_or_else(|| classify_message(message))
            }
            Self::Turn(turn) => turn.kind,
            other => classify_message(&other.to_string()),
        }
    }

    /// Whether retrying the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } if (500..=599).contains(status) => true,
            _ => matches!(
                self.kind(),
                ErrorKind::RateLimited | ErrorKind::NetworkError | ErrorKind::Timeout
            ),
        }
    }

    /// Convert into the single user-facing error raised at the end of a failed turn.
    pub fn into_turn_error(self) -> TurnError {
        match self {
            Self::Turn(turn) => turn,
            other => TurnError::from_error(&other),
        }
    }
}

fn join_fields(fields: &[ConfigField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ParleyError>;

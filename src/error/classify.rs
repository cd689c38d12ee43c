//! User-facing error classification.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::Display;

use super::ParleyError;

/// Error taxonomy surfaced to the person chatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    ConfigIncomplete,
    InvalidCredential,
    EndpointNotFound,
    RateLimited,
    NetworkError,
    Timeout,
    MissingCredential,
    Unknown,
}

impl ErrorKind {
    /// Map an HTTP status to a kind, when the status alone is conclusive.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            401 | 403 => Some(Self::InvalidCredential),
            404 => Some(Self::EndpointNotFound),
            429 => Some(Self::RateLimited),
            408 | 504 => Some(Self::Timeout),
            _ => None,
        }
    }

    /// Readable message for this kind. `original` is kept for `Unknown`.
    pub fn user_message(self, original: &str) -> String {
        match self {
            Self::ConfigIncomplete => {
                format!("The configuration is incomplete: {original}")
            }
            Self::InvalidCredential => {
                "The API key is invalid or has expired; please check the configuration".into()
            }
            Self::EndpointNotFound => {
                "The model does not exist or the base URL is wrong; please check the configuration"
                    .into()
            }
            Self::RateLimited => "Too many requests; please try again later".into(),
            Self::NetworkError => {
                "Network connection failed; please check the network settings".into()
            }
            Self::Timeout => "The request timed out; please check the network connection".into(),
            Self::MissingCredential => format!("A credential is missing: {original}"),
            Self::Unknown => format!("The chat request failed: {original}"),
        }
    }
}

fn timeout_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)time[sd]?[ -]?out").expect("valid regex"))
}

fn network_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)network|enotfound|econnrefused|econnreset|dns error|connection (refused|reset|closed)|error sending request")
            .expect("valid regex")
    })
}

/// Classify a raw error message by substring.
///
/// Status codes take precedence, then timeout wording, then network wording.
pub fn classify_message(message: &str) -> ErrorKind {
    if message.contains("401") {
        ErrorKind::InvalidCredential
    } else if message.contains("404") {
        ErrorKind::EndpointNotFound
    } else if message.contains("429") {
        ErrorKind::RateLimited
    } else if timeout_pattern().is_match(message) {
        ErrorKind::Timeout
    } else if network_pattern().is_match(message) {
        ErrorKind::NetworkError
    } else {
        ErrorKind::Unknown
    }
}

/// A classified, user-facing turn failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnError {
    pub kind: ErrorKind,
    /// Message shown to the user.
    pub message: String,
    /// Original error text, for logs.
    pub detail: String,
}

impl TurnError {
    pub fn from_error(error: &ParleyError) -> Self {
        let detail = error.to_string();
        let kind = error.kind();
        Self {
            kind,
            message: kind.user_message(&detail),
            detail,
        }
    }
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

//! Uniform result envelope returned to the model for every tool call.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::Display;

use crate::error::ParleyError;

/// Why a tool call failed, as reported to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolFailureKind {
    InvalidArguments,
    UnknownTool,
    MissingCredential,
    NotFound,
    /// The remote API answered with an error or could not be reached.
    Upstream,
    /// The capability is not available in this host.
    Unavailable,
    Internal,
}

impl ToolFailureKind {
    pub fn from_error(error: &ParleyError) -> Self {
        match error {
            ParleyError::InvalidArgument(_) => Self::InvalidArguments,
            ParleyError::MissingCredential(_) => Self::MissingCredential,
            ParleyError::ModelNotFound(_) => Self::NotFound,
            ParleyError::UnsupportedOperation(_)
            | ParleyError::ConfigIncomplete { .. }
            | ParleyError::Configuration(_) => Self::Unavailable,
            ParleyError::Api { .. }
            | ParleyError::Network(_)
            | ParleyError::Authentication(_)
            | ParleyError::RateLimited { .. }
            | ParleyError::Timeout(_) => Self::Upstream,
            _ => Self::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: ToolFailureKind,
    pub message: String,
}

/// Result of one tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(Value),
    Failure(ToolFailure),
}

impl ToolOutcome {
    pub fn failure(kind: ToolFailureKind, message: impl Into<String>) -> Self {
        Self::Failure(ToolFailure {
            kind,
            message: message.into(),
        })
    }

    pub fn from_error(error: &ParleyError) -> Self {
        Self::failure(ToolFailureKind::from_error(error), error.to_string())
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// The JSON payload placed in the tool result message.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Success(data) => json!({ "ok": true, "data": data }),
            Self::Failure(failure) => json!({ "ok": false, "error": failure }),
        }
    }
}

impl From<crate::error::Result<Value>> for ToolOutcome {
    fn from(result: crate::error::Result<Value>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(err) => Self::from_error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn envelope_shapes() {
        assert_eq!(
            ToolOutcome::Success(json!(["a"])).to_value(),
            json!({"ok": true, "data": ["a"]})
        );
        assert_eq!(
            ToolOutcome::failure(ToolFailureKind::UnknownTool, "no such tool").to_value(),
            json!({"ok": false, "error": {"kind": "unknown_tool", "message": "no such tool"}})
        );
    }

    #[test]
    fn maps_errors_to_kinds() {
        let cases = [
            (ParleyError::MissingCredential("TAVILY_API_KEY".into()), ToolFailureKind::MissingCredential),
            (ParleyError::ModelNotFound("x".into()), ToolFailureKind::NotFound),
            (ParleyError::api(502, "bad gateway"), ToolFailureKind::Upstream),
            (ParleyError::UnsupportedOperation("no ui".into()), ToolFailureKind::Unavailable),
            (ParleyError::InvalidState("?".into()), ToolFailureKind::Internal),
        ];
        for (error, kind) in cases {
            assert_eq!(ToolFailureKind::from_error(&error), kind, "{error}");
        }
    }
}

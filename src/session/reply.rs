use std::fmt;

use serde::Serialize;

/// Shown when a run ends without any text.
pub const FALLBACK_REPLY: &str = "Sorry, the model could not respond right now.";

/// The answer to one user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    /// Display name of the agent the turn started on.
    pub started_by: String,
    /// Display name of the agent that produced the text.
    pub ended_by: String,
}

impl Reply {
    pub fn new(text: impl Into<String>, started_by: impl Into<String>, ended_by: impl Into<String>) -> Self {
        let text: String = text.into();
        let text = if text.trim().is_empty() {
            FALLBACK_REPLY.to_string()
        } else {
            text
        };
        Self {
            text,
            started_by: started_by.into(),
            ended_by: ended_by.into(),
        }
    }

    pub fn handed_off(&self) -> bool {
        self.started_by != self.ended_by
    }

    /// `"<start> → <end>: "` when the turn changed agents, else `"<name>: "`.
    pub fn prefix(&self) -> String {
        if self.handed_off() {
            format!("{} → {}: ", self.started_by, self.ended_by)
        } else {
            format!("{}: ", self.ended_by)
        }
    }

    pub fn rendered(&self) -> String {
        format!("{}{}", self.prefix(), self.text)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix(), self.text)
    }
}

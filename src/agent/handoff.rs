//! Delegation edges between agents.

use bon::Builder;
use serde_json::json;

use super::definition::AgentRole;
use crate::provider::ToolDefinition;
use crate::types::{ContentPart, ModelMessage, Role};

/// How the history is shown to the agent receiving a handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFilter {
    /// Full history.
    #[default]
    None,
    /// Hide earlier tool calls and tool results.
    RemoveToolCalls,
}

impl InputFilter {
    /// The model-facing view of `history`. The transcript itself is never
    /// filtered.
    pub fn apply(self, history: &[ModelMessage]) -> Vec<ModelMessage> {
        match self {
            Self::None => history.to_vec(),
            Self::RemoveToolCalls => history.iter().filter_map(strip_tool_traffic).collect(),
        }
    }
}

fn strip_tool_traffic(message: &ModelMessage) -> Option<ModelMessage> {
    if message.role == Role::Tool {
        return None;
    }
    if !message.has_tool_traffic() {
        return Some(message.clone());
    }
    let content: Vec<ContentPart> = message
        .content
        .iter()
        .filter(|part| matches!(part, ContentPart::Text { text } if !text.is_empty()))
        .cloned()
        .collect();
    if content.is_empty() {
        return None;
    }
    let mut kept = message.clone();
    kept.content = content;
    Some(kept)
}

/// An outgoing delegation edge, exposed to the model as a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct Handoff {
    pub target: AgentRole,
    pub tool_name: String,
    pub description: String,
    pub input_filter: InputFilter,
}

impl Handoff {
    pub fn default_tool_name(target: AgentRole) -> String {
        format!("transfer_to_{target}")
    }

    /// Handoff tools take no arguments.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.tool_name.clone(),
            description: self.description.clone(),
            parameters: json!({ "type": "object", "properties": {}, "required": [] }),
        }
    }
}

/// Options for [`DelegationPhase::delegate`](super::DelegationPhase::delegate).
#[derive(Debug, Clone, Default, Builder)]
pub struct HandoffOptions {
    /// Tool name of the forward edge; `transfer_to_<target>` when unset.
    #[builder(into)]
    pub tool_name: Option<String>,
    #[builder(into)]
    pub description: Option<String>,
    #[builder(default)]
    pub input_filter: InputFilter,
    /// Tool name of the implicit edge back to the source.
    #[builder(into)]
    pub return_tool_name: Option<String>,
}

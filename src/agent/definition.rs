//! A single agent: instructions, model, tools and outgoing handoffs.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::handoff::Handoff;
use super::prompts::HANDOFF_PREAMBLE;
use crate::provider::ToolDefinition;
use crate::tools::ToolRegistry;

/// Position of an agent in the conversation.
///
/// The session's active-agent pointer stores a role rather than an agent,
/// so it stays valid when the graph is rebuilt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
    Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgentRole {
    /// Owns the conversation; every run can return here.
    #[default]
    Main,
    /// Model management specialist.
    Helper,
}

impl AgentRole {
    pub fn default_name(self) -> &'static str {
        match self {
            Self::Main => "Assistant",
            Self::Helper => "Model Helper",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    role: AgentRole,
    name: String,
    description: String,
    model_id: String,
    instructions: String,
    tools: ToolRegistry,
    pub(crate) handoffs: Vec<Handoff>,
}

impl Agent {
    pub fn new(role: AgentRole, model_id: impl Into<String>) -> Self {
        Self {
            role,
            name: role.default_name().to_string(),
            description: String::new(),
            model_id: model_id.into(),
            instructions: String::new(),
            tools: ToolRegistry::new(),
            handoffs: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn handoffs(&self) -> &[Handoff] {
        &self.handoffs
    }

    /// The handoff triggered by calling `tool_name`, if any.
    pub fn handoff_for(&self, tool_name: &str) -> Option<&Handoff> {
        self.handoffs.iter().find(|h| h.tool_name == tool_name)
    }

    /// System prompt sent at the top of every request made by this agent.
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::new();
        if !self.handoffs.is_empty() {
            prompt.push_str(HANDOFF_PREAMBLE);
            prompt.push_str("\n\n");
        }
        prompt.push_str(self.instructions.trim());
        prompt.push_str(&format!(
            "\n\nYou are {}, running on the model `{}`.",
            self.name, self.model_id
        ));
        prompt
    }

    /// Regular tools followed by one tool per outgoing handoff.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut defs = self.tools.definitions();
        defs.extend(self.handoffs.iter().map(Handoff::definition));
        defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::InputFilter;

    #[test]
    fn prompt_names_the_model() {
        let agent = Agent::new(AgentRole::Main, "qwen/qwen-2.5-3b-instruct").with_instructions("Be brief.");
        let prompt = agent.system_prompt();

        assert!(prompt.starts_with("Be brief."));
        assert!(prompt.contains("`qwen/qwen-2.5-3b-instruct`"));
        assert!(prompt.contains("Assistant"));
    }

    #[test]
    fn preamble_only_when_agent_can_hand_off() {
        let mut agent = Agent::new(AgentRole::Helper, "m").with_instructions("Help.");
        assert!(!agent.system_prompt().contains(HANDOFF_PREAMBLE));

        agent.handoffs.push(Handoff {
            target: AgentRole::Main,
            tool_name: "back".into(),
            description: "Return".into(),
            input_filter: InputFilter::None,
        });
        assert!(agent.system_prompt().starts_with(HANDOFF_PREAMBLE));
        assert_eq!(agent.tool_definitions().last().unwrap().name, "back");
        assert!(agent.handoff_for("back").is_some());
    }

    #[test]
    fn role_names() {
        assert_eq!(AgentRole::Helper.to_string(), "helper");
        assert_eq!(AgentRole::Helper.default_name(), "Model Helper");
        assert_eq!("main".parse::<AgentRole>().unwrap(), AgentRole::Main);
    }
}

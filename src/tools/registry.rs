//! Ordered set of tools and the dispatch boundary used by the run loop.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::outcome::{ToolFailureKind, ToolOutcome};
use super::tool::{Tool, ToolExecutionContext};
use super::validation::validate_arguments;
use crate::error::{ParleyError, Result};
use crate::provider::ToolDefinition;
use crate::types::AgentToolCall;

/// Tools available to one agent, keyed by unique name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting duplicate names.
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        if self.get(tool.name()).is_some() {
            return Err(ParleyError::InvalidArgument(format!(
                "duplicate tool name '{}'",
                tool.name()
            )));
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions advertised to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters().schema.clone(),
            })
            .collect()
    }

    /// Execute one call. Never fails: every problem becomes a failure
    /// outcome the model can read.
    pub async fn dispatch(&self, call: &AgentToolCall, ctx: &ToolExecutionContext) -> ToolOutcome {
        let Some(tool) = self.get(&call.name) else {
            warn!(tool = %call.name, agent = %ctx.agent, "Model called an unknown tool");
            return ToolOutcome::failure(
                ToolFailureKind::UnknownTool,
                format!(
                    "unknown tool '{}'; available tools: {}",
                    call.name,
                    self.names().join(", ")
                ),
            );
        };

        let args = match ToolArguments::parse(&call.arguments) {
            Ok(args) => args,
            Err(err) => return ToolOutcome::from_error(&err),
        };
        if let Err(message) = validate_arguments(args.raw(), &tool.parameters().schema) {
            debug!(tool = %call.name, %message, "Rejected tool arguments");
            return ToolOutcome::failure(ToolFailureKind::InvalidArguments, message);
        }

        debug!(tool = %call.name, call_id = %call.id, "Executing tool");
        let outcome = ToolOutcome::from(tool.execute(&args, ctx).await);
        if let ToolOutcome::Failure(failure) = &outcome {
            warn!(tool = %call.name, kind = %failure.kind, message = %failure.message, "Tool call failed");
        }
        outcome
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRole;
    use crate::config::{ChatConfig, ConfigStore};
    use crate::context::SessionContext;
    use crate::tools::{AgentTool, AgentToolParameters};
    use serde_json::json;

    fn echo() -> Arc<dyn Tool> {
        Arc::new(AgentTool::new(
            "echo",
            "Echo the text back",
            AgentToolParameters::object()
                .bounded_string("text", "Text", 1, 5, true)
                .build(),
            |args, _ctx| async move { Ok(json!(args.get_str("text")?)) },
        ))
    }

    fn failing() -> Arc<dyn Tool> {
        Arc::new(AgentTool::new(
            "boom",
            "Always fails",
            AgentToolParameters::empty(),
            |_args, _ctx| async move { Err(ParleyError::MissingCredential("no key".into())) },
        ))
    }

    fn ctx() -> ToolExecutionContext {
        let store = Arc::new(ConfigStore::in_memory(ChatConfig::defaults()));
        ToolExecutionContext::new(SessionContext::new(store), AgentRole::Main, Vec::new())
    }

    fn call(name: &str, arguments: serde_json::Value) -> AgentToolCall {
        AgentToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments,
        }
    }

    #[test]
    fn rejects_duplicate_names() {
        assert!(ToolRegistry::from_tools([echo(), echo()]).is_err());
    }

    #[tokio::test]
    async fn dispatches_valid_call() {
        let registry = ToolRegistry::from_tools([echo()]).unwrap();
        let outcome = registry.dispatch(&call("echo", json!({"text": "hi"})), &ctx()).await;

        assert_eq!(outcome, ToolOutcome::Success(json!("hi")));
    }

    #[tokio::test]
    async fn unknown_tool_and_bad_arguments_fail_softly() {
        let registry = ToolRegistry::from_tools([echo(), failing()]).unwrap();
        let ctx = ctx();

        let unknown = registry.dispatch(&call("nope", json!({})), &ctx).await;
        let too_long = registry.dispatch(&call("echo", json!({"text": "toolong"})), &ctx).await;
        let raised = registry.dispatch(&call("boom", json!({})), &ctx).await;

        assert!(matches!(unknown, ToolOutcome::Failure(f) if f.kind == ToolFailureKind::UnknownTool));
        assert!(matches!(too_long, ToolOutcome::Failure(f) if f.kind == ToolFailureKind::InvalidArguments));
        assert!(matches!(raised, ToolOutcome::Failure(f) if f.kind == ToolFailureKind::MissingCredential));
    }
}

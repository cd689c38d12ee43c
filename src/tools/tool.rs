//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use super::arguments::ToolArguments;
use super::types::AgentToolParameters;
use crate::agent::AgentRole;
use crate::context::SessionContext;
use crate::error::Result;
use crate::types::ModelMessage;

/// What a tool can see while it runs.
#[derive(Debug, Clone)]
pub struct ToolExecutionContext {
    pub session: SessionContext,
    /// Agent that issued the call.
    pub agent: AgentRole,
    /// Transcript of the current run up to and including the calling
    /// assistant message.
    pub history: Vec<ModelMessage>,
}

impl ToolExecutionContext {
    pub fn new(session: SessionContext, agent: AgentRole, history: Vec<ModelMessage>) -> Self {
        Self {
            session,
            agent,
            history,
        }
    }
}

/// Core tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable name the model calls the tool by.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> &AgentToolParameters;

    /// Run the tool. Errors are turned into failure results by the
    /// registry; they never abort the run.
    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<Value>;
}

type ToolHandler =
    dyn Fn(ToolArguments, ToolExecutionContext) -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// Closure-based tool.
pub struct AgentTool {
    name: String,
    description: String,
    parameters: AgentToolParameters,
    handler: Arc<ToolHandler>,
}

impl AgentTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: AgentToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<Value> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

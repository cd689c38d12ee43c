//! Executing one turn of the conversation against an agent graph.

pub mod loop_runner;

pub use loop_runner::LoopRunner;

use async_trait::async_trait;
use bon::Builder;
use uuid::Uuid;

use crate::agent::{AgentGraph, AgentRole};
use crate::context::SessionContext;
use crate::error::Result;
use crate::types::{ModelMessage, Usage};
use crate::util::RetryPolicy;

/// Model calls allowed in one run unless overridden.
pub const DEFAULT_MAX_TURNS: usize = 15;

#[derive(Debug, Clone, Builder)]
pub struct RunOptions {
    /// Upper bound on model calls within the run.
    #[builder(default = DEFAULT_MAX_TURNS)]
    pub max_turns: usize,
    /// Retry applied to each model call.
    #[builder(default)]
    pub retry: RetryPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// What a finished run hands back to the session.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: Uuid,
    /// Input history plus everything the run appended.
    pub history: Vec<ModelMessage>,
    /// Agent that produced the final output.
    pub last_agent: AgentRole,
    pub final_output: String,
    pub steps: usize,
    pub usage: Usage,
}

/// Runs a turn: call the model, execute tools, follow handoffs.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(
        &self,
        graph: &AgentGraph,
        start: AgentRole,
        input: Vec<ModelMessage>,
        options: &RunOptions,
        ctx: &SessionContext,
    ) -> Result<RunResult>;
}

//! The conversation orchestrator.
//!
//! A [`ChatSession`] owns the transcript and the active-agent pointer. Each
//! [`ChatSession::send_message`] runs one turn through a [`Runner`] and, on
//! success, adopts the run's history and last agent.

mod reply;

pub use reply::{Reply, FALLBACK_REPLY};

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::agent::{default_graph, AgentGraph, AgentRole};
use crate::config::{self, ChatConfig};
use crate::context::SessionContext;
use crate::error::{ParleyError, Result};
use crate::runner::{LoopRunner, RunOptions, Runner};
use crate::types::ModelMessage;

/// Builds the agent graph for a configuration.
pub type GraphFactory = Arc<dyn Fn(&ChatConfig) -> Result<AgentGraph> + Send + Sync>;

pub struct ChatSession {
    ctx: SessionContext,
    runner: Arc<dyn Runner>,
    graph_factory: GraphFactory,
    options: RunOptions,
    config_rx: watch::Receiver<ChatConfig>,
    graph: Option<Arc<AgentGraph>>,
    transcript: Vec<ModelMessage>,
    active: AgentRole,
}

impl ChatSession {
    pub fn new(ctx: SessionContext) -> Self {
        let config_rx = ctx.config.subscribe();
        Self {
            ctx,
            runner: Arc::new(LoopRunner),
            graph_factory: Arc::new(default_graph),
            options: RunOptions::default(),
            config_rx,
            graph: None,
            transcript: Vec::new(),
            active: AgentRole::Main,
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn Runner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_graph_factory(mut self, factory: GraphFactory) -> Self {
        self.graph_factory = factory;
        self.graph = None;
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one user turn.
    ///
    /// Fails with `ConfigIncomplete` before any network traffic when the
    /// configuration cannot drive a run. Any other failure is classified
    /// into [`ParleyError::Turn`]; the transcript and active agent are left
    /// as they were.
    pub async fn send_message(&mut self, text: impl Into<String>) -> Result<Reply> {
        let graph = self.current_graph()?;
        let start = if graph.contains(self.active) {
            self.active
        } else {
            AgentRole::Main
        };
        let started_by = graph.agent(start)?.name().to_string();

        let mut input = self.transcript.clone();
        input.push(ModelMessage::user(text));

        self.ctx.tracer.start();
        let result = self
            .runner
            .run(&graph, start, input, &self.options, &self.ctx)
            .await;
        self.ctx.tracer.shutdown();

        match result {
            Ok(run) => {
                let ended_by = graph
                    .agent(run.last_agent)
                    .map(|a| a.name().to_string())
                    .unwrap_or_else(|_| run.last_agent.default_name().to_string());
                debug!(
                    run_id = %run.run_id,
                    steps = run.steps,
                    tokens = run.usage.total_tokens,
                    messages = run.history.len(),
                    "Turn completed"
                );
                self.transcript = run.history;
                self.active = run.last_agent;
                Ok(Reply::new(run.final_output, started_by, ended_by))
            }
            Err(err) => {
                let turn = err.into_turn_error();
                debug!(detail = %turn.detail, "Turn failure detail");
                warn!(kind = %turn.kind, "Turn failed");
                Err(ParleyError::Turn(turn))
            }
        }
    }

    /// Forget the conversation and return to the Main agent.
    pub fn clear_history(&mut self) {
        self.transcript.clear();
        self.active = AgentRole::Main;
    }

    pub fn transcript(&self) -> &[ModelMessage] {
        &self.transcript
    }

    pub fn active_agent(&self) -> AgentRole {
        self.active
    }

    /// The graph used by the last turn, if one was built yet.
    pub fn graph(&self) -> Option<&AgentGraph> {
        self.graph.as_deref()
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    fn current_graph(&mut self) -> Result<Arc<AgentGraph>> {
        let changed = self.config_rx.has_changed().unwrap_or(false);
        let config = self.config_rx.borrow_and_update().clone();
        if changed && self.graph.is_some() {
            info!(model_id = %config.model_id, "Configuration changed, rebuilding agents");
            self.graph = None;
        }
        config::validate(&config)?;

        if let Some(graph) = &self.graph {
            return Ok(graph.clone());
        }
        let graph = Arc::new((self.graph_factory)(&config)?);
        self.graph = Some(graph.clone());
        Ok(graph)
    }
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("active", &self.active)
            .field("transcript_len", &self.transcript.len())
            .field("has_graph", &self.graph.is_some())
            .finish_non_exhaustive()
    }
}

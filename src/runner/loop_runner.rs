//! The default call-model/run-tools/handoff loop.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{RunOptions, RunResult, Runner};
use crate::agent::{AgentGraph, AgentRole, Handoff, InputFilter};
use crate::context::SessionContext;
use crate::error::{ParleyError, Result};
use crate::provider::{FinishReason, ModelProvider, ProviderRequest};
use crate::tools::{ToolExecutionContext, ToolFailureKind, ToolOutcome};
use crate::trace::{RunStatus, TraceEvent};
use crate::types::{ContentPart, ModelMessage, Usage};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoopRunner;

/// History prefix hidden behind a filter after a filtered handoff.
#[derive(Debug, Clone, Copy)]
struct FilteredPrefix {
    filter: InputFilter,
    len: usize,
}

fn model_view(history: &[ModelMessage], prefix: Option<FilteredPrefix>) -> Vec<ModelMessage> {
    match prefix {
        None => history.to_vec(),
        Some(FilteredPrefix { filter, len }) => {
            let mut view = filter.apply(&history[..len]);
            view.extend_from_slice(&history[len..]);
            view
        }
    }
}

#[async_trait]
impl Runner for LoopRunner {
    async fn run(
        &self,
        graph: &AgentGraph,
        start: AgentRole,
        input: Vec<ModelMessage>,
        options: &RunOptions,
        ctx: &SessionContext,
    ) -> Result<RunResult> {
        let run_id = Uuid::new_v4();
        let start_agent = graph.agent(start)?;
        let provider = ctx.provider()?;

        info!(%run_id, agent = start_agent.name(), provider = provider.provider_name(), "Run started");
        ctx.tracer.record(
            run_id,
            TraceEvent::RunStarted {
                agent: start_agent.name().to_string(),
            },
        );

        let mut state = RunState {
            run_id,
            current: start,
            history: input,
            usage: Usage::default(),
        };
        let outcome = drive(graph, provider.as_ref(), &mut state, options, ctx).await;

        let ended_on = graph
            .agent(state.current)
            .map(|a| a.name().to_string())
            .unwrap_or_default();
        match &outcome {
            Ok(result) => {
                info!(%run_id, agent = %ended_on, steps = result.steps, "Run finished");
                ctx.tracer.record(
                    run_id,
                    TraceEvent::RunEnded {
                        agent: ended_on,
                        status: RunStatus::Completed,
                        error: None,
                    },
                );
            }
            Err(err) => {
                warn!(%run_id, agent = %ended_on, error = %err, "Run failed");
                ctx.tracer.record(
                    run_id,
                    TraceEvent::RunEnded {
                        agent: ended_on,
                        status: RunStatus::Failed,
                        error: Some(err.to_string()),
                    },
                );
            }
        }
        outcome
    }
}

struct RunState {
    run_id: Uuid,
    current: AgentRole,
    history: Vec<ModelMessage>,
    usage: Usage,
}

async fn drive(
    graph: &AgentGraph,
    provider: &dyn ModelProvider,
    state: &mut RunState,
    options: &RunOptions,
    ctx: &SessionContext,
) -> Result<RunResult> {
    let mut prefix: Option<FilteredPrefix> = None;

    for step in 1..=options.max_turns {
        let agent = graph.agent(state.current)?;
        ctx.tracer.record(
            state.run_id,
            TraceEvent::StepStarted {
                step,
                agent: agent.name().to_string(),
            },
        );

        let mut messages = vec![ModelMessage::system(agent.system_prompt())];
        messages.extend(model_view(&state.history, prefix));
        let mut request = ProviderRequest::new(agent.model_id(), messages);
        request.tools = agent.tool_definitions();

        debug!(step, agent = agent.name(), messages = request.messages.len(), "Calling model");
        let response = options
            .retry
            .execute(|| provider.generate_text(&request))
            .await?;
        state.usage.merge(&response.usage);
        if response.finish_reason == Some(FinishReason::Length) {
            warn!(step, agent = agent.name(), "Model output was truncated at the token limit");
        }

        let mut parts = Vec::with_capacity(response.tool_calls.len() + 1);
        if !response.text.is_empty() {
            parts.push(ContentPart::text(response.text.clone()));
        }
        parts.extend(response.tool_calls.iter().cloned().map(ContentPart::ToolCall));
        if !parts.is_empty() {
            state
                .history
                .push(ModelMessage::assistant_parts(parts).with_name(agent.name()));
        }

        if response.tool_calls.is_empty() {
            ctx.tracer.record(
                state.run_id,
                TraceEvent::StepEnded {
                    step,
                    agent: agent.name().to_string(),
                    tool_calls: Vec::new(),
                    handoff: None,
                },
            );
            return Ok(RunResult {
                run_id: state.run_id,
                history: std::mem::take(&mut state.history),
                last_agent: state.current,
                final_output: response.text,
                steps: step,
                usage: state.usage,
            });
        }

        let mut handoff: Option<Handoff> = None;
        for call in &response.tool_calls {
            let outcome = match agent.handoff_for(&call.name) {
                Some(edge) if handoff.is_none() => {
                    let target = graph.agent(edge.target)?;
                    handoff = Some(edge.clone());
                    ToolOutcome::Success(json!({ "assistant": target.name() }))
                }
                Some(_) => ToolOutcome::failure(
                    ToolFailureKind::Unavailable,
                    "only the first handoff of a step is followed",
                ),
                None => {
                    let tool_ctx =
                        ToolExecutionContext::new(ctx.clone(), state.current, state.history.clone());
                    agent.tools().dispatch(call, &tool_ctx).await
                }
            };
            state.history.push(ModelMessage::tool_result(
                call.id.clone(),
                outcome.to_value(),
                outcome.is_failure(),
            ));
        }

        let target_name = match &handoff {
            Some(edge) => Some(graph.agent(edge.target)?.name().to_string()),
            None => None,
        };
        ctx.tracer.record(
            state.run_id,
            TraceEvent::StepEnded {
                step,
                agent: agent.name().to_string(),
                tool_calls: response.tool_calls.iter().map(|c| c.name.clone()).collect(),
                handoff: target_name.clone(),
            },
        );

        if let Some(edge) = handoff {
            info!(from = agent.name(), to = ?target_name, "Handoff");
            state.current = edge.target;
            prefix = match edge.input_filter {
                InputFilter::None => None,
                filter => Some(FilteredPrefix {
                    filter,
                    len: state.history.len(),
                }),
            };
        }
    }

    Err(ParleyError::MaxTurnsExceeded(options.max_turns))
}

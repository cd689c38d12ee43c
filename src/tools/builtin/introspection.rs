use std::sync::Arc;

use serde_json::{json, Value};

use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolExecutionContext};

use super::{GET_HISTORY, GET_TRACE};

/// Trace of the run in progress, or the last finished run.
pub fn get_trace_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        GET_TRACE,
        "Get the trace of the current (or most recent) agent run: steps, tool calls and handoffs",
        AgentToolParameters::empty(),
        |_args, ctx: ToolExecutionContext| async move {
            match ctx.session.tracer.last_run_tracing() {
                Some(trace) => Ok(serde_json::to_value(trace)?),
                None => Ok(json!({ "run": Value::Null, "note": "no run has been traced yet" })),
            }
        },
    ))
}

/// The conversation as seen by the current run.
pub fn get_history_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        GET_HISTORY,
        "Get the conversation history of this chat, including tool calls",
        AgentToolParameters::empty(),
        |_args, ctx: ToolExecutionContext| async move {
            Ok(json!({
                "messages": serde_json::to_value(&ctx.history)?,
                "count": ctx.history.len(),
            }))
        },
    ))
}

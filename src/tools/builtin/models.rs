use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::config::ConfigUpdate;
use crate::error::ParleyError;
use crate::models::{find_model, model_ids};
use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolExecutionContext};

use super::{GET_CURRENT_CONFIG, LIST_MODELS, MODEL_DETAIL, SWITCH_TO_MODEL};

const MAX_MODEL_ID_CHARS: usize = 100;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelIdArgs {
    model_id: String,
}

/// Model ids offered by the endpoint. Refreshes the shared model cache.
pub fn list_models_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        LIST_MODELS,
        "List the ids of the models available at the configured endpoint; the user can pick one to chat with",
        AgentToolParameters::object()
            .boolean(
                "tool_capable_only",
                "Only list models that support both tools and response_format",
                false,
            )
            .build(),
        |args, ctx: ToolExecutionContext| async move {
            let tool_capable_only = args.get_bool_opt("tool_capable_only").unwrap_or(false);
            let models = ctx.session.refresh_models().await?;
            Ok(json!(model_ids(&models, tool_capable_only)))
        },
    ))
}

/// Full catalog entry for one model id.
pub fn model_detail_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        MODEL_DETAIL,
        "Get the details of one model as JSON",
        AgentToolParameters::object()
            .bounded_string("modelId", "Model id", 1, MAX_MODEL_ID_CHARS, true)
            .build(),
        |args, ctx: ToolExecutionContext| async move {
            let ModelIdArgs { model_id } = args.deserialize()?;
            let models = ctx.session.models().await?;
            let model = find_model(&models, &model_id)
                .ok_or_else(|| ParleyError::ModelNotFound(model_id.clone()))?;
            Ok(serde_json::to_value(model)?)
        },
    ))
}

/// Change the configured model. Takes effect on the next user message.
pub fn switch_to_model_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        SWITCH_TO_MODEL,
        "Switch the chat to another model id",
        AgentToolParameters::object()
            .bounded_string("modelId", "Id of the model to switch to", 1, MAX_MODEL_ID_CHARS, true)
            .build(),
        |args, ctx: ToolExecutionContext| async move {
            let ModelIdArgs { model_id } = args.deserialize()?;
            let report = ctx.session.config.update(ConfigUpdate::model(model_id.as_str()))?;
            Ok(json!({
                "modelId": model_id,
                "saved": report.persisted,
                "warning": report.warning,
                "note": "the new model is used from the next message on",
            }))
        },
    ))
}

/// Current configuration with secrets masked.
pub fn get_current_config_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        GET_CURRENT_CONFIG,
        "Get the current configuration, including the model id and base URL",
        AgentToolParameters::empty(),
        |_args, ctx: ToolExecutionContext| async move {
            Ok(serde_json::to_value(ctx.session.config.masked())?)
        },
    ))
}

use std::sync::Arc;

use serde_json::json;

use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolExecutionContext};

use super::SWITCH_THEME;

/// Toggle the host's light/dark theme.
pub fn switch_theme_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        SWITCH_THEME,
        "Switch the application theme between light and dark",
        AgentToolParameters::empty(),
        |_args, ctx: ToolExecutionContext| async move {
            let theme = ctx.session.ui.switch_theme().await?;
            Ok(json!({ "theme": theme }))
        },
    ))
}

//! Built-in tools.
//!
//! Each constructor returns an `Arc<dyn Tool>` built with [`AgentTool::new`].
//! [`main_tools`] is the general-purpose set given to the Main agent and
//! [`helper_tools`] the model-management set given to the Helper agent.
//!
//! [`AgentTool::new`]: crate::tools::AgentTool::new

mod introspection;
mod models;
mod search;
mod theme;

use std::sync::Arc;

pub use introspection::{get_history_tool, get_trace_tool};
pub use models::{get_current_config_tool, list_models_tool, model_detail_tool, switch_to_model_tool};
pub use search::{extract_webcontent_tool, search_tool, set_search_key_tool};
pub use theme::switch_theme_tool;

use super::Tool;

pub const SWITCH_THEME: &str = "switch_theme";
pub const GET_TRACE: &str = "get_trace";
pub const GET_HISTORY: &str = "get_history";
pub const SEARCH: &str = "search_tool";
pub const EXTRACT_WEBCONTENT: &str = "extract_webcontent_tool";
pub const SET_SEARCH_KEY: &str = "set_search_tool_key_TAVILY_API_KEY";
pub const LIST_MODELS: &str = "list_models";
pub const MODEL_DETAIL: &str = "model_detail";
pub const SWITCH_TO_MODEL: &str = "switch_to_model";
pub const GET_CURRENT_CONFIG: &str = "get_current_config";

/// Tools of the Main agent.
pub fn main_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        switch_theme_tool(),
        get_trace_tool(),
        get_history_tool(),
        search_tool(),
        extract_webcontent_tool(),
        set_search_key_tool(),
    ]
}

/// Tools of the Helper agent.
pub fn helper_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        list_models_tool(),
        model_detail_tool(),
        switch_to_model_tool(),
        get_current_config_tool(),
    ]
}

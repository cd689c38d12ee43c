use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::config::ConfigUpdate;
use crate::error::{ParleyError, Result};
use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolExecutionContext};

use super::{EXTRACT_WEBCONTENT, SEARCH, SET_SEARCH_KEY};

const MAX_QUERY_CHARS: usize = 400;
const MAX_URL_CHARS: usize = 2048;
const MAX_KEY_CHARS: usize = 100;

fn tavily_key(ctx: &ToolExecutionContext) -> Result<String> {
    ctx.session
        .config
        .get()
        .tavily_api_key()
        .map(str::to_string)
        .ok_or_else(|| {
            ParleyError::MissingCredential(format!(
                "TAVILY_API_KEY is not set; ask the user to create a key at https://tavily.com \
                 and save it with {SET_SEARCH_KEY}"
            ))
        })
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
}

/// Web search through Tavily.
pub fn search_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        SEARCH,
        "Search the web with the Tavily API and return the results as JSON",
        AgentToolParameters::object()
            .bounded_string("query", "Search query", 1, MAX_QUERY_CHARS, true)
            .build(),
        |args, ctx: ToolExecutionContext| async move {
            let SearchArgs { query } = args.deserialize()?;
            let key = tavily_key(&ctx)?;
            ctx.session.search.search(&key, &query).await
        },
    ))
}

#[derive(Deserialize)]
struct ExtractArgs {
    url: String,
}

/// Page content extraction through Tavily.
pub fn extract_webcontent_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        EXTRACT_WEBCONTENT,
        "Extract the readable content of a web page with the Tavily API",
        AgentToolParameters::object()
            .bounded_string("url", "URL of the page to extract", 1, MAX_URL_CHARS, true)
            .build(),
        |args, ctx: ToolExecutionContext| async move {
            let ExtractArgs { url } = args.deserialize()?;
            let key = tavily_key(&ctx)?;
            ctx.session.search.extract(&key, &url).await
        },
    ))
}

/// Save the Tavily key into the configuration.
pub fn set_search_key_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        SET_SEARCH_KEY,
        "Save the Tavily API key used by the web search tools",
        AgentToolParameters::object()
            .bounded_string("apiKey", "Tavily API key", 1, MAX_KEY_CHARS, true)
            .build(),
        |args, ctx: ToolExecutionContext| async move {
            let key = args.get_str("apiKey")?.to_string();
            let report = ctx
                .session
                .config
                .update(ConfigUpdate::builder().tavily_api_key(key).build())?;
            Ok(json!({
                "saved": report.persisted,
                "warning": report.warning,
            }))
        },
    ))
}

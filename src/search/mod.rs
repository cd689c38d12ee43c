//! Web search and page extraction.

pub mod tavily;

pub use tavily::TavilyClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A web search provider.
///
/// The key is passed per call because it lives in the config store and
/// can change mid-session.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, api_key: &str, query: &str) -> Result<Value>;

    async fn extract(&self, api_key: &str, url: &str) -> Result<Value>;
}

//! Tavily REST client.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::Result;
use crate::provider::http::{bearer_headers, endpoint, shared_client, status_to_error};

use super::SearchBackend;

pub const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com";

#[derive(Debug, Clone)]
pub struct TavilyClient {
    base_url: String,
}

impl Default for TavilyClient {
    fn default() -> Self {
        Self::new(DEFAULT_TAVILY_URL)
    }
}

impl TavilyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    async fn post(&self, api_key: &str, path: &str, body: Value) -> Result<Value> {
        let url = endpoint(&self.base_url, path);
        debug!(%url, "tavily request");

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &text));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl SearchBackend for TavilyClient {
    async fn search(&self, api_key: &str, query: &str) -> Result<Value> {
        self.post(api_key, "search", json!({ "query": query })).await
    }

    async fn extract(&self, api_key: &str, url: &str) -> Result<Value> {
        self.post(api_key, "extract", json!({ "urls": [url] })).await
    }
}

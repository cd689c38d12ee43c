//! Model provider trait and the OpenAI-compatible implementation.

pub mod format;
pub mod http;
pub mod openai_compatible;
pub mod sanitize;

pub use openai_compatible::{OpenAiCompatibleFactory, OpenAiCompatibleProvider};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{info, warn};

use crate::config::ChatConfig;
use crate::error::Result;
use crate::models::ModelInfo;
use crate::types::{AgentToolCall, ModelMessage, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<ModelMessage>,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl ProviderRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ModelMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Why generation finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}

/// Response from a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub tool_calls: Vec<AgentToolCall>,
    pub finish_reason: Option<FinishReason>,
}

/// Core trait implemented by model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name, used for logs.
    fn provider_name(&self) -> &str;

    /// Generate one assistant message (non-streaming).
    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse>;

    /// Models advertised by the endpoint.
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}

/// Builds a provider for the current configuration.
///
/// Called once per run and by the model tools, so a config change takes
/// effect on the next call without any explicit reconnect.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, config: &ChatConfig) -> Result<Arc<dyn ModelProvider>>;
}

/// Result of a connectivity check against the configured endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionReport {
    pub model: String,
    pub response: String,
}

/// Send a short prompt to `model` and report what came back.
pub async fn test_connection(
    provider: &dyn ModelProvider,
    model: &str,
) -> Result<ConnectionReport> {
    let mut request = ProviderRequest::new(
        model,
        vec![
            ModelMessage::system(
                "You are a helpful assistant. Reply with \"connection ok\" to confirm the connection.",
            ),
            ModelMessage::user("Connection test"),
        ],
    );
    request.max_tokens = Some(20);
    request.temperature = Some(0.1);

    match provider.generate_text(&request).await {
        Ok(response) => {
            info!(model, "Connection test succeeded");
            let text = if response.text.trim().is_empty() {
                "connected, but the model returned an empty reply".to_string()
            } else {
                response.text
            };
            Ok(ConnectionReport {
                model: model.to_string(),
                response: text,
            })
        }
        Err(err) => {
            warn!(model, error = %err, kind = %err.kind(), "Connection test failed");
            Err(err)
        }
    }
}


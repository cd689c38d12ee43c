//! Provider for any endpoint speaking the OpenAI Chat Completions dialect.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{self, ChatConfig};
use crate::error::{ParleyError, Result};
use crate::models::ModelInfo;
use crate::types::{AgentToolCall, ContentPart, ModelMessage, Role, Usage};

use super::format::{content_to_text, tool_result_to_string};
use super::http::{bearer_headers, endpoint, shared_client, status_to_error};
use super::sanitize::normalize_for_dispatch;
use super::{
    FinishReason, ModelProvider, ProviderFactory, ProviderRequest, ProviderResponse,
};

/// Chat Completions client bound to one base URL and key.
///
/// The model id travels with each request, so one provider serves every
/// agent of a run.
pub struct OpenAiCompatibleProvider {
    api_key: String,
    base_url: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.api_key.clone(), config.base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request_body(&self, request: &ProviderRequest) -> Value {
        let messages = normalize_for_dispatch(&request.messages)
            .iter()
            .flat_map(message_to_openai)
            .collect::<Vec<_>>();

        let mut body = json!({
            "model": request.model,
            "messages": messages,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(max) = request.max_tokens {
                obj.insert("max_tokens".into(), max.into());
            }
            if let Some(temp) = request.temperature {
                obj.insert("temperature".into(), temp.into());
            }
            if !request.tools.is_empty() {
                let tool_defs: Vec<Value> = request
                    .tools
                    .iter()
                    .map(|t| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters,
                            }
                        })
                    })
                    .collect();
                obj.insert("tools".into(), tool_defs.into());
            }
        }

        body
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
    fn provider_name(&self) -> &str {
        "openai-compatible"
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let body = self.build_request_body(request);
        let url = endpoint(&self.base_url, "chat/completions");

        debug!(model = %request.model, tools = request.tools.len(), "chat completion");

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: ChatResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ParleyError::api(status, "No choices in chat completion response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| AgentToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: parse_arguments(tc.function.arguments),
            })
            .collect();

        Ok(ProviderResponse {
            text: content_to_text(&choice.message.content),
            usage: data
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
            tool_calls,
            finish_reason: choice.finish_reason.as_deref().and_then(parse_finish_reason),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = endpoint(&self.base_url, "models");
        debug!(%url, "listing models");

        let resp = shared_client()
            .get(&url)
            .headers(bearer_headers(&self.api_key))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: ModelList = resp.json().await?;
        Ok(data.data)
    }
}

/// Default factory: validates the config, then binds a provider to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiCompatibleFactory;

impl ProviderFactory for OpenAiCompatibleFactory {
    fn create(&self, config: &ChatConfig) -> Result<Arc<dyn ModelProvider>> {
        config::validate(config)?;
        Ok(Arc::new(OpenAiCompatibleProvider::from_config(config)))
    }
}

fn parse_arguments(raw: String) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn parse_finish_reason(s: &str) -> Option<FinishReason> {
    match s {
        "stop" => Some(FinishReason::Stop),
        "length" => Some(FinishReason::Length),
        "tool_calls" | "function_call" => Some(FinishReason::ToolCalls),
        "content_filter" => Some(FinishReason::ContentFilter),
        _ => None,
    }
}

/// Convert one message into wire messages. A tool message carrying several
/// results expands into one wire message per result.
fn message_to_openai(msg: &ModelMessage) -> Vec<Value> {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    if msg.role == Role::Tool {
        return msg
            .content
            .iter()
            .filter_map(|part| match part {
                ContentPart::ToolResult(tr) => Some(json!({
                    "role": "tool",
                    "tool_call_id": tr.tool_call_id,
                    "content": tool_result_to_string(&tr.result),
                })),
                _ => None,
            })
            .collect();
    }

    // Some endpoints reject array content on assistant turns, so text is
    // always sent as a single string.
    let text = joined_text(msg);
    let tool_calls = msg.tool_calls();
    if tool_calls.is_empty() {
        return vec![json!({ "role": role, "content": text })];
    }

    let tc_json: Vec<Value> = tool_calls
        .iter()
        .map(|tc| {
            json!({
                "id": tc.id,
                "type": "function",
                "function": {
                    "name": tc.name,
                    "arguments": tc.arguments.to_string(),
                }
            })
        })
        .collect();
    vec![json!({
        "role": role,
        "content": if text.is_empty() { Value::Null } else { Value::String(text) },
        "tool_calls": tc_json,
    })]
}

fn joined_text(msg: &ModelMessage) -> String {
    msg.content
        .iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// Wire response types

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Value,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelInfo>,
}

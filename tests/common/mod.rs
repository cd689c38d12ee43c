//! Shared test helpers and a scripted provider.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use parley::config::{ChatConfig, ConfigStore};
use parley::context::SessionContext;
use parley::error::{ParleyError, Result};
use parley::models::ModelInfo;
use parley::provider::{
    FinishReason, ModelProvider, ProviderFactory, ProviderRequest, ProviderResponse,
};
use parley::types::{AgentToolCall, Usage};

/// Provider that replays queued responses and records every request.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ProviderResponse>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    models: Mutex<Vec<ModelInfo>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queue_text(&self, text: &str) {
        self.queue(Ok(ProviderResponse {
            text: text.to_string(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
                total_tokens: 30,
            },
            tool_calls: vec![],
            finish_reason: Some(FinishReason::Stop),
        }));
    }

    pub fn queue_tool_call(&self, id: &str, name: &str, args: Value) {
        self.queue(Ok(ProviderResponse {
            text: String::new(),
            usage: Usage::default(),
            tool_calls: vec![AgentToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: args,
            }],
            finish_reason: Some(FinishReason::ToolCalls),
        }));
    }

    pub fn queue_tool_calls(&self, calls: &[(&str, &str, Value)]) {
        self.queue(Ok(ProviderResponse {
            tool_calls: calls
                .iter()
                .map(|(id, name, args)| AgentToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments: args.clone(),
                })
                .collect(),
            finish_reason: Some(FinishReason::ToolCalls),
            ..Default::default()
        }));
    }

    pub fn queue_error(&self, error: ParleyError) {
        self.queue(Err(error));
    }

    pub fn set_models(&self, models: Vec<ModelInfo>) {
        *self.models.lock().unwrap() = models;
    }

    fn queue(&self, response: Result<ProviderResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> ProviderRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was made")
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ProviderResponse {
                text: "Mock response".to_string(),
                ..Default::default()
            }))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(self.models.lock().unwrap().clone())
    }
}

/// Hands out the same scripted provider for every config, counting calls.
pub struct ScriptedFactory {
    pub provider: Arc<ScriptedProvider>,
    pub created: Mutex<Vec<ChatConfig>>,
}

impl ProviderFactory for ScriptedFactory {
    fn create(&self, config: &ChatConfig) -> Result<Arc<dyn ModelProvider>> {
        parley::config::validate(config)?;
        self.created.lock().unwrap().push(config.clone());
        Ok(self.provider.clone())
    }
}

pub fn complete_config() -> ChatConfig {
    ChatConfig {
        api_key: "sk-test".into(),
        base_url: "https://llm.example.test/v1".into(),
        model_id: "vendor/model-a".into(),
        ..ChatConfig::default()
    }
}

/// Context over an in-memory store and a scripted provider.
pub fn scripted_context(config: ChatConfig) -> (SessionContext, Arc<ScriptedProvider>) {
    let provider = ScriptedProvider::new();
    let store = Arc::new(ConfigStore::in_memory(config));
    let ctx = SessionContext::new(store).with_providers(Arc::new(ScriptedFactory {
        provider: provider.clone(),
        created: Mutex::new(Vec::new()),
    }));
    (ctx, provider)
}

/// The JSON payload of the tool result for `call_id` in `messages`.
pub fn tool_result(messages: &[parley::types::ModelMessage], call_id: &str) -> Value {
    messages
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|part| match part {
            parley::types::ContentPart::ToolResult(r) if r.tool_call_id == call_id => {
                Some(r.result.clone())
            }
            _ => None,
        })
        .unwrap_or_else(|| panic!("no tool result for {call_id}"))
}

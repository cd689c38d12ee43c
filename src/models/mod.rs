//! Model catalog entries returned by `GET /models`.

use serde::{Deserialize, Serialize};

/// One model advertised by the endpoint.
///
/// Only `id` is guaranteed; providers such as OpenRouter add metadata,
/// which is kept verbatim in `extra` so `model_detail` can show all of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_parameters: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            context_length: None,
            supported_parameters: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Whether the endpoint says this model accepts `param`.
    pub fn supports(&self, param: &str) -> bool {
        self.supported_parameters.iter().any(|p| p == param)
    }

    /// Usable for agent turns: accepts both tools and response formats.
    pub fn is_tool_capable(&self) -> bool {
        self.supports("tools") && self.supports("response_format")
    }
}

/// Find a model by exact id.
pub fn find_model<'a>(models: &'a [ModelInfo], model_id: &str) -> Option<&'a ModelInfo> {
    models.iter().find(|m| m.id == model_id)
}

/// Ids of `models`, optionally restricted to tool-capable ones.
pub fn model_ids(models: &[ModelInfo], tool_capable_only: bool) -> Vec<String> {
    models
        .iter()
        .filter(|m| !tool_capable_only || m.is_tool_capable())
        .map(|m| m.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> Vec<ModelInfo> {
        serde_json::from_value(json!([
            {
                "id": "openai/gpt-4o",
                "name": "GPT-4o",
                "context_length": 128000,
                "supported_parameters": ["tools", "response_format", "temperature"],
                "pricing": {"prompt": "0.0000025"}
            },
            {"id": "meta/llama-3-8b", "supported_parameters": ["temperature"]},
            {"id": "bare-model"}
        ]))
        .unwrap()
    }

    #[test]
    fn keeps_unknown_fields() {
        let models = catalog();

        assert_eq!(models[0].extra["pricing"]["prompt"], "0.0000025");
        let round = serde_json::to_value(&models[0]).unwrap();
        assert_eq!(round["pricing"]["prompt"], "0.0000025");
        assert_eq!(round["context_length"], 128000);
    }

    #[test]
    fn filters_tool_capable_ids() {
        let models = catalog();

        assert_eq!(model_ids(&models, false).len(), 3);
        assert_eq!(model_ids(&models, true), vec!["openai/gpt-4o".to_string()]);
    }

    #[test]
    fn finds_by_exact_id() {
        let models = catalog();

        assert!(find_model(&models, "bare-model").is_some());
        assert!(find_model(&models, "bare").is_none());
    }
}

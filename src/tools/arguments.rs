//! Typed access to tool call arguments.

use serde_json::Value;

use crate::error::{ParleyError, Result};

/// Arguments of one tool call, already validated against the tool schema.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    /// Wrap raw call arguments.
    ///
    /// Some models send the arguments object as a JSON-encoded string; it is
    /// decoded here, and an empty string becomes `{}`.
    pub fn parse(raw: &Value) -> Result<Self> {
        let value = match raw {
            Value::String(text) if text.trim().is_empty() => serde_json::json!({}),
            Value::String(text) => serde_json::from_str(text.trim()).map_err(|e| {
                ParleyError::InvalidArgument(format!("arguments are not valid JSON: {e}"))
            })?,
            Value::Null => serde_json::json!({}),
            other => other.clone(),
        };
        Ok(Self { value })
    }

    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn raw(&self) -> &Value {
        &self.value
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ParleyError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    pub fn get_bool_opt(&self, key: &str) -> Option<bool> {
        self.value.get(key).and_then(|v| v.as_bool())
    }

    /// Deserialize the whole argument object into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            ParleyError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_stringified_arguments() {
        let args = ToolArguments::parse(&json!(r#"{"modelId":"a/b"}"#)).unwrap();
        assert_eq!(args.get_str("modelId").unwrap(), "a/b");

        let empty = ToolArguments::parse(&json!("  ")).unwrap();
        assert_eq!(empty.raw(), &json!({}));
    }

    #[test]
    fn rejects_garbage_strings() {
        assert!(matches!(
            ToolArguments::parse(&json!("{oops")),
            Err(ParleyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn typed_access() {
        #[derive(serde::Deserialize)]
        struct Query {
            query: String,
        }
        let args = ToolArguments::new(json!({"query": "rust", "flag": true}));

        assert_eq!(args.deserialize::<Query>().unwrap().query, "rust");
        assert_eq!(args.get_bool_opt("flag"), Some(true));
        assert!(args.get_str("missing").is_err());
        assert_eq!(args.get_str_opt("missing"), None);
    }
}

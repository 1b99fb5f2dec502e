use levergraph_core::LeverageError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolStatus {
    Completed,
    Failed,
}

/// Uniform tool answer. Tool-specific fields are flattened next to
/// `status` and `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub status: ToolStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, JsonValue>,
}

impl ToolResponse {
    pub fn completed(message: impl Into<String>, payload: Map<String, JsonValue>) -> Self {
        Self {
            status: ToolStatus::Completed,
            message: message.into(),
            error_kind: None,
            payload,
        }
    }

    pub fn failed(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Failed,
            message: message.into(),
            error_kind: Some(kind.into()),
            payload: Map::new(),
        }
    }

    pub fn from_error(err: &LeverageError) -> Self {
        Self::failed(err.kind(), err.to_string())
    }

    pub fn is_completed(&self) -> bool {
        self.status == ToolStatus::Completed
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.payload.get(key)
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "status": ToolStatus::Failed,
                "message": format!("failed to serialize response: {}", e),
                "error_kind": "serialization"
            })
        })
    }
}

/// Output of one tool: a summary line and the tool-specific fields.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub message: String,
    pub payload: Map<String, JsonValue>,
}

impl ToolOutput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            payload: Map::new(),
        }
    }

    pub fn with<T: Serialize>(mut self, key: &str, value: T) -> levergraph_core::Result<Self> {
        self.payload
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }
}

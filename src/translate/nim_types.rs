//! Wire types for the NVIDIA NIM chat completion endpoint.
//!
//! Only the fields the proxy reads or writes are modelled; everything inside a
//! choice's `message` and the `usage` object is kept as raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NimChatRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Value>,
    pub temperature: Value,
    pub max_tokens: Value,
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NimChatResponse {
    #[serde(default)]
    pub choices: Vec<NimChoice>,
    #[serde(default)]
    pub usage: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NimChoice {
    #[serde(default)]
    pub message: Value,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Error bodies vary by NIM deployment; `detail` is the field worth surfacing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NimErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

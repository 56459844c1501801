use super::nim_types::NimChatRequest;
use super::openai_types::ChatCompletionRequest;
use serde_json::Value;
use std::collections::HashMap;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u64 = 4096;

/// Map an inbound model name to the upstream one. Unknown names pass through
/// unchanged; nothing checks that the upstream actually serves them.
#[must_use]
pub fn resolve_model<'a>(requested: &'a str, model_map: &'a HashMap<String, String>) -> &'a str {
    model_map.get(requested).map_or(requested, String::as_str)
}

/// Translate an inbound chat completion request into a NIM request.
/// Pure function. Streaming is always disabled upstream; `messages` and any
/// caller-supplied sampling values are copied without inspection.
#[must_use]
pub fn openai_to_nim(
    req: &ChatCompletionRequest,
    model_map: &HashMap<String, String>,
) -> NimChatRequest {
    NimChatRequest {
        model: resolve_model(&req.model, model_map).to_string(),
        messages: req.messages.clone(),
        temperature: req
            .temperature
            .clone()
            .unwrap_or_else(|| Value::from(DEFAULT_TEMPERATURE)),
        max_tokens: req
            .max_tokens
            .clone()
            .filter(is_set)
            .unwrap_or_else(|| Value::from(DEFAULT_MAX_TOKENS)),
        stream: false,
    }
}

/// A zero, empty or `false` token budget counts as no budget.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

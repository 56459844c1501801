use super::nim_types::{NimChatResponse, NimErrorBody};
use super::openai_types::{ChatCompletionResponse, Choice, ErrorResponse};
use crate::error::{ProxyError, Result};
use serde_json::Value;

/// Translate a NIM response into an OpenAI chat completion envelope.
///
/// `original_model` is the name the caller asked for; the upstream model name
/// is never exposed. Only the first choice is kept. A response without any
/// choices is rejected rather than answered with an empty envelope.
pub fn nim_to_openai(resp: NimChatResponse, original_model: &str) -> Result<ChatCompletionResponse> {
    let NimChatResponse { choices, usage } = resp;
    let first = choices
        .into_iter()
        .next()
        .ok_or_else(|| ProxyError::translation("Upstream response contained no choices"))?;

    Ok(ChatCompletionResponse {
        id: completion_id(),
        object: "chat.completion".to_string(),
        created: chrono::Utc::now().timestamp(),
        model: original_model.to_string(),
        choices: vec![Choice {
            index: 0,
            message: first.message,
            finish_reason: first.finish_reason,
        }],
        usage,
    })
}

#[must_use]
pub fn completion_id() -> String {
    format!("chatcmpl-{}", uuid::Uuid::new_v4().simple())
}

/// Build the error envelope for a non-2xx upstream answer. The body's `detail`
/// wins; otherwise the message names the status code.
#[must_use]
pub fn nim_error_to_openai(status: u16, body: &str) -> ErrorResponse {
    let detail = serde_json::from_str::<NimErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| match d {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });

    ErrorResponse::proxy_error(
        detail.unwrap_or_else(|| format!("Request failed with status code {status}")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nim_response(body: Value) -> NimChatResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_success_envelope() {
        let resp = nim_response(json!({
            "id": "nim-123",
            "model": "z-ai/glm5",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "hi"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        }));

        let out = nim_to_openai(resp, "gpt-4o").unwrap();
        assert!(out.id.starts_with("chatcmpl-"));
        assert_eq!(out.object, "chat.completion");
        assert_eq!(out.model, "gpt-4o");
        assert!(out.created > 0);
        assert_eq!(out.choices.len(), 1);
        assert_eq!(out.choices[0].index, 0);
        assert_eq!(out.choices[0].message["content"], "hi");
        assert_eq!(out.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(out.usage.unwrap()["total_tokens"], 5);
    }

    #[test]
    fn test_only_first_choice_kept() {
        let resp = nim_response(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "first"}, "finish_reason": "stop"},
                {"message": {"role": "assistant", "content": "second"}, "finish_reason": "length"}
            ]
        }));

        let out = nim_to_openai(resp, "gpt-4").unwrap();
        assert_eq!(out.choices.len(), 1);
        assert_eq!(out.choices[0].message["content"], "first");
        assert!(out.usage.is_none());
    }

    #[test]
    fn test_reasoning_content_preserved() {
        let resp = nim_response(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "4", "reasoning_content": "2+2"},
                "finish_reason": "stop"
            }]
        }));

        let out = nim_to_openai(resp, "o1").unwrap();
        assert_eq!(out.choices[0].message["reasoning_content"], "2+2");
    }

    #[test]
    fn test_empty_choices_rejected() {
        let resp = nim_response(json!({"choices": [], "usage": {"total_tokens": 0}}));
        let err = nim_to_openai(resp, "gpt-4").unwrap_err();
        assert!(matches!(err, ProxyError::Translation { .. }));
    }

    #[test]
    fn test_ids_differ() {
        assert_ne!(completion_id(), completion_id());
    }

    #[test]
    fn test_error_prefers_detail() {
        let err = nim_error_to_openai(429, r#"{"detail": "rate limited"}"#);
        assert_eq!(err, ErrorResponse::proxy_error("rate limited"));
    }

    #[test]
    fn test_error_structured_detail_serialized() {
        let err = nim_error_to_openai(422, r#"{"detail": [{"loc": ["body", "messages"]}]}"#);
        assert_eq!(err.error.message, r#"[{"loc":["body","messages"]}]"#);
    }

    #[test]
    fn test_error_without_detail_names_status() {
        let err = nim_error_to_openai(503, "<html>Service Unavailable</html>");
        assert_eq!(err.error.message, "Request failed with status code 503");
        assert_eq!(err.error.error_type, "proxy_error");

        let err = nim_error_to_openai(401, r#"{"detail": null}"#);
        assert_eq!(err.error.message, "Request failed with status code 401");
    }
}

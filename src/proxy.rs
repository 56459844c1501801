use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};
use crate::translate::nim_types::NimChatResponse;
use crate::translate::openai_types::{ChatCompletionRequest, ChatCompletionResponse, ErrorResponse};
use crate::translate::request::openai_to_nim;
use crate::translate::response::{nim_error_to_openai, nim_to_openai};

use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Outcome of proxying a chat completion request
pub enum ProxyResult {
    Success(ChatCompletionResponse),
    Error(ErrorResponse, u16),
}

/// Everything the translator needs about the upstream, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Upstream {
    pub url: String,
    pub api_key: Option<String>,
    pub models: HashMap<String, String>,
}

impl Upstream {
    #[must_use]
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            url: config.chat_completions_url(),
            api_key: config.resolve_api_key(),
            models: config.models.clone(),
        }
    }
}

/// Forward one chat completion request to NIM and translate the answer.
///
/// Non-2xx upstream answers come back as `ProxyResult::Error` carrying the
/// upstream status. Transport failures and unusable 2xx bodies are `Err`.
pub async fn proxy_chat_completion(
    req: &ChatCompletionRequest,
    upstream: &Upstream,
    client: &reqwest::Client,
) -> Result<ProxyResult> {
    let nim_req = openai_to_nim(req, &upstream.models);

    info!(
        requested = %req.model,
        upstream_model = %nim_req.model,
        "POST {}", upstream.url
    );

    let mut builder = client.post(&upstream.url).json(&nim_req);
    if let Some(ref key) = upstream.api_key {
        builder = builder.bearer_auth(key);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| ProxyError::upstream(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProxyError::upstream(format!("Failed to read response body: {e}")))?;

    debug!(status = status.as_u16(), body_len = body.len(), "Upstream responded");

    if !status.is_success() {
        error!(status = status.as_u16(), body = %truncate(&body, 500), "Upstream error");
        return Ok(ProxyResult::Error(
            nim_error_to_openai(status.as_u16(), &body),
            status.as_u16(),
        ));
    }

    let nim_resp: NimChatResponse = serde_json::from_str(&body).map_err(|e| {
        ProxyError::translation(format!(
            "Failed to parse upstream response: {}. Body: {}",
            e,
            truncate(&body, 300)
        ))
    })?;

    if nim_resp.choices.len() > 1 {
        warn!(choices = nim_resp.choices.len(), "Dropping all but the first choice");
    }

    let resp = nim_to_openai(nim_resp, &req.model)?;
    info!(id = %resp.id, model = %resp.model, "Completed");

    Ok(ProxyResult::Success(resp))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

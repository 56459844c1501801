use crate::config::ProxyConfig;
use crate::proxy::{self, Upstream};
use crate::translate::openai_types::{ChatCompletionRequest, ErrorResponse};

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub const SERVICE_NAME: &str = "OpenAI to NVIDIA NIM Proxy";

#[derive(Clone)]
pub struct AppState {
    pub config: ProxyConfig,
    pub upstream: Upstream,
    pub client: reqwest::Client,
}

impl AppState {
    /// Freeze the configuration for the life of the server.
    #[must_use]
    pub fn new(config: ProxyConfig, client: reqwest::Client) -> Self {
        let upstream = Upstream::from_config(&config);
        Self {
            config,
            upstream,
            client,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/chat/completions", post(handle_chat_completions))
        .route("/health", get(handle_health))
        .route("/v1/models", get(handle_models))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_chat_completions(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let req: ChatCompletionRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("Failed to parse request: {}", e);
            let err = ErrorResponse::proxy_error(format!("Invalid request body: {e}"));
            return (StatusCode::BAD_REQUEST, Json(err)).into_response();
        }
    };

    if req.stream == Some(true) {
        warn!(model = %req.model, "Streaming requested but not supported; answering non-streaming");
    }

    info!(
        model = %req.model,
        messages = req
            .messages
            .as_ref()
            .and_then(serde_json::Value::as_array)
            .map_or(0, Vec::len),
        "Chat completion request"
    );

    match proxy::proxy_chat_completion(&req, &state.upstream, &state.client).await {
        Ok(proxy::ProxyResult::Success(resp)) => Json(resp).into_response(),
        Ok(proxy::ProxyResult::Error(err, status_code)) => {
            let status =
                StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(err)).into_response()
        }
        Err(e) => {
            error!("Proxy error: {}", e);
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(ErrorResponse::proxy_error(e.to_string()))).into_response()
        }
    }
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let reasoning_display = if state.config.show_reasoning {
        "enabled"
    } else {
        "disabled"
    };

    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "reasoning_display": reasoning_display,
        "thinking_mode": false,
    }))
}

async fn handle_models(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let mut names: Vec<&String> = state.config.models.keys().collect();
    names.sort();

    let models: Vec<serde_json::Value> = names
        .into_iter()
        .map(|name| {
            serde_json::json!({
                "id": name,
                "object": "model",
                "owned_by": "nvidia-nim",
            })
        })
        .collect();

    Json(serde_json::json!({ "data": models, "object": "list" }))
}

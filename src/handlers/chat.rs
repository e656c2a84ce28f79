use axum::{Json, extract::{State, rejection::JsonRejection}};
use std::sync::Arc;
use std::time::Instant;
use crate::client_id::ClientId;
use crate::error::RelayError;
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_LATENCY, REQUEST_TOTAL, UPSTREAM_ERRORS};
use crate::models::{ChatRequest, ChatResponse};
use crate::state::AppState;

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    ClientId(client_id): ClientId,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, RelayError> {
    REQUEST_TOTAL.inc();

    // malformed bodies never reach the limiter
    let Json(payload) =
        payload.map_err(|rejection| RelayError::InvalidRequest(rejection.body_text()))?;
    payload.validate()?;

    if state.rate_limiter.is_rate_limited(&client_id) {
        RATE_LIMITED_TOTAL.inc();
        tracing::info!(client = %client_id, "request throttled");
        return Err(RelayError::RateLimited);
    }

    if payload.messages.is_empty() {
        return Err(RelayError::NoMessages);
    }

    let start_time = Instant::now();

    let result = state.provider.complete(&payload).await;
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    let completion = result.inspect_err(|e| {
        UPSTREAM_ERRORS.inc();
        tracing::warn!(client = %client_id, model = %payload.model, "completion failed: {e}");
    })?;
    tracing::debug!(client = %client_id, model = %payload.model, "completion relayed");

    Ok(Json(ChatResponse::new(payload.model, completion)))
}

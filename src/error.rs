use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    // our own limiter
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("No messages provided")]
    NoMessages,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("OpenAI API key not configured")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    // the provider throttled us
    #[error("OpenAI API rate limit exceeded")]
    UpstreamRateLimited,

    #[error("Input too long")]
    InputTooLong,

    #[error("Error: {0}")]
    Upstream(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RateLimited | Self::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::NoMessages | Self::InputTooLong => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{self}");
        }

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

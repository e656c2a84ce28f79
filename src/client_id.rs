use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::convert::Infallible;
use std::net::SocketAddr;

// Shared by every request whose peer address is unavailable
pub const UNKNOWN_CLIENT: &str = "unknown";

// Rate limit bucket for a request: the peer IP, proxy headers are ignored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

        Ok(Self(id))
    }
}

//! Request extractors.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

/// Stable per-caller identity used as the rate limit key.
///
/// Resolution order:
/// 1. First address in `X-Forwarded-For` (the service has always run behind
///    a proxy such as Cloud Run)
/// 2. The socket peer address from `ConnectInfo`
/// 3. `"unknown"` — every unattributable caller shares one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        if let Some(ip) = forwarded {
            return Ok(ClientIp(ip));
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(ClientIp(peer.unwrap_or_else(|| "unknown".to_string())))
    }
}

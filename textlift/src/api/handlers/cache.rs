use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::extractors::ClientIp;
use crate::api::state::AppState;
use crate::cache::CacheStats;
use crate::error::{Result, TextliftError};

#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: String,
}

/// `GET /api/cache/stats`
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// `DELETE /api/cache/clear`
///
/// Destructive, so it gets its own (stricter) rate limit.
pub async fn clear_cache(
    State(state): State<AppState>,
    ClientIp(identity): ClientIp,
) -> Result<Json<ClearResponse>> {
    state
        .limiter
        .check("cache-clear", &identity, &state.config.rate_limit.cache_clear)
        .map_err(|retry_after_secs| TextliftError::RateLimited { retry_after_secs })?;

    let response = if state.cache.clear() {
        ClearResponse {
            success: true,
            message: "Cache cleared successfully".to_string(),
        }
    } else {
        ClearResponse {
            success: false,
            message: "Cache not available".to_string(),
        }
    };

    Ok(Json(response))
}

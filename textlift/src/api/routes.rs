use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers;
use super::AppState;

// Multipart framing overhead on top of the configured file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.allowed_origins);
    // Oversized bodies are rejected in validation with a 400, so the
    // transport-level limit sits above the configured file size.
    let body_limit =
        DefaultBodyLimit::max(state.config.upload.max_file_size_bytes + MULTIPART_OVERHEAD_BYTES);

    let api = Router::new()
        .route("/extract-text", post(handlers::extract::extract_text))
        .route("/health", get(handlers::health::health_check))
        .route("/cache/stats", get(handlers::cache::cache_stats))
        .route("/cache/clear", delete(handlers::cache::clear_cache));

    Router::new()
        .route("/", get(handlers::health::service_info))
        .nest("/api", api)
        .fallback(not_found)
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid ALLOWED_ORIGINS entry");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found" })))
}

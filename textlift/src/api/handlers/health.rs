use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::api::state::AppState;
use crate::ocr::OCR_ENGINE;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub ocr_engine: &'static str,
    pub cache_enabled: bool,
    pub supported_formats: Vec<String>,
}

/// `GET /api/health`
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        ocr_engine: OCR_ENGINE,
        cache_enabled: state.cache.stats().enabled,
        supported_formats: state.config.upload.allowed_extensions.clone(),
    })
}

/// `GET /` — service info and endpoint map.
pub async fn service_info() -> Json<serde_json::Value> {
    Json(json!({
        "message": "OCR Image Text Extraction API",
        "version": env!("CARGO_PKG_VERSION"),
        "ocr_engine": OCR_ENGINE,
        "endpoints": {
            "extract_text": "/api/extract-text",
            "health": "/api/health",
            "cache_stats": "/api/cache/stats",
            "cache_clear": "/api/cache/clear",
        }
    }))
}

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

use crate::api::extractors::ClientIp;
use crate::api::state::AppState;
use crate::cache::CacheEntry;
use crate::config::UploadConfig;
use crate::error::{Result, TextliftError};
use crate::fingerprint::fingerprint;
use crate::ocr::OCR_ENGINE;

#[derive(Debug, Clone, Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub ocr_engine: &'static str,
    pub text: String,
    pub confidence: f32,
    pub processing_time_ms: u64,
    pub cached: bool,
}

struct Upload {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// `POST /api/extract-text`
///
/// Admission → validation → cache probe → extraction → cache store, strictly
/// in that order, terminal on first failure. A cache hit short-circuits the
/// upstream call entirely.
pub async fn extract_text(
    State(state): State<AppState>,
    ClientIp(identity): ClientIp,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>> {
    state
        .limiter
        .check("extract", &identity, &state.config.rate_limit.extract)
        .map_err(|retry_after_secs| TextliftError::RateLimited { retry_after_secs })?;

    let upload = read_upload(multipart).await?;
    validate_upload(&upload, &state.config.upload)?;

    let fp = fingerprint(&upload.bytes);

    if let Some(entry) = state.cache.get(&fp) {
        info!(fingerprint = %fp, "Serving OCR result from cache");
        return Ok(Json(ExtractResponse {
            success: true,
            ocr_engine: OCR_ENGINE,
            text: entry.text,
            confidence: entry.confidence,
            processing_time_ms: entry.processing_time_ms,
            cached: true,
        }));
    }

    info!(
        fingerprint = %fp,
        size = upload.bytes.len(),
        "Processing image with {} OCR engine",
        OCR_ENGINE
    );

    let started = Instant::now();
    let outcome = state.ocr.extract(&upload.bytes).await?;
    let processing_time_ms = (started.elapsed().as_millis() as u64).max(1);

    info!(
        chars = outcome.text.len(),
        processing_time_ms, "OCR processing successful"
    );

    // Store failures never fail the request; the fresh result still goes out.
    let stored = state.cache.put(CacheEntry {
        fingerprint: fp.clone(),
        text: outcome.text.clone(),
        confidence: outcome.confidence,
        processing_time_ms,
        cached: false,
        created_at: Utc::now(),
    });
    if !stored {
        debug!(fingerprint = %fp, "OCR result not cached");
    }

    Ok(Json(ExtractResponse {
        success: true,
        ocr_engine: OCR_ENGINE,
        text: outcome.text,
        confidence: outcome.confidence,
        processing_time_ms,
        cached: false,
    }))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| TextliftError::InvalidInput(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(|name| name.to_string());
        let content_type = field.content_type().map(|ct| ct.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| TextliftError::InvalidInput(format!("Failed to read upload: {e}")))?
            .to_vec();

        return Ok(Upload {
            filename,
            content_type,
            bytes,
        });
    }

    Err(TextliftError::InvalidInput(
        "Missing required 'file' field".to_string(),
    ))
}

fn validate_upload(upload: &Upload, config: &UploadConfig) -> Result<()> {
    let filename = upload
        .filename
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| TextliftError::InvalidInput("No filename provided".to_string()))?;

    let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    if !filename.contains('.') || !config.allowed_extensions.contains(&extension) {
        return Err(TextliftError::InvalidInput(format!(
            "Invalid file type. Only {} files are allowed",
            config.allowed_extensions.join(", ").to_uppercase()
        )));
    }

    let content_type_ok = upload
        .content_type
        .as_deref()
        .map(|ct| config.allowed_content_types.contains(&ct.to_lowercase()))
        .unwrap_or(false);
    if !content_type_ok {
        return Err(TextliftError::InvalidInput(
            "Invalid content type. Only image uploads are allowed".to_string(),
        ));
    }

    if upload.bytes.len() > config.max_file_size_bytes {
        return Err(TextliftError::InvalidInput(format!(
            "File size exceeds maximum allowed size of {}MB",
            config.max_file_size_bytes / (1024 * 1024)
        )));
    }

    if upload.bytes.is_empty() {
        return Err(TextliftError::InvalidInput(
            "Empty file uploaded".to_string(),
        ));
    }

    Ok(())
}

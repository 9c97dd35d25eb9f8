use std::time::Duration;

use tracing::{info, warn};

use crate::config::OcrConfig;
use crate::error::{Result, TextliftError};

use super::api::{GoogleVisionClient, OcrOutcome};

enum OcrBackend {
    Api { client: GoogleVisionClient },
    Unavailable { reason: String },
}

/// Process-wide OCR collaborator, constructed once at startup and injected
/// into the request path via `AppState`.
pub struct OcrProvider {
    backend: OcrBackend,
    config: OcrConfig,
}

impl OcrProvider {
    pub fn new(config: &OcrConfig) -> Self {
        let backend = match GoogleVisionClient::new(config) {
            Ok(client) => {
                info!("Google Vision OCR backend initialized");
                OcrBackend::Api { client }
            }
            Err(e) => {
                let reason = format!("Google Vision OCR backend unavailable: {e}");
                warn!("{}", reason);
                OcrBackend::Unavailable { reason }
            }
        };

        Self {
            backend,
            config: config.clone(),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    /// Extract text from `image_bytes`, bounded by the configured timeout so
    /// a hanging upstream call cannot pin a request task indefinitely.
    pub async fn extract(&self, image_bytes: &[u8]) -> Result<OcrOutcome> {
        let timeout = Duration::from_secs(self.config.timeout_secs);

        match tokio::time::timeout(timeout, self.extract_internal(image_bytes)).await {
            Ok(result) => result,
            Err(_) => Err(TextliftError::Upstream(format!(
                "OCR request timed out after {} seconds",
                self.config.timeout_secs
            ))),
        }
    }

    async fn extract_internal(&self, image_bytes: &[u8]) -> Result<OcrOutcome> {
        match &self.backend {
            OcrBackend::Api { client } => client.extract(image_bytes).await,
            OcrBackend::Unavailable { reason } => {
                Err(TextliftError::Upstream(reason.clone()))
            }
        }
    }
}

impl Clone for OcrProvider {
    fn clone(&self) -> Self {
        match &self.backend {
            OcrBackend::Api { client } => Self {
                backend: OcrBackend::Api {
                    client: client.clone(),
                },
                config: self.config.clone(),
            },
            OcrBackend::Unavailable { reason } => Self {
                backend: OcrBackend::Unavailable {
                    reason: reason.clone(),
                },
                config: self.config.clone(),
            },
        }
    }
}

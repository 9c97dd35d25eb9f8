use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OcrConfig;
use crate::error::{Result, TextliftError};

const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com";

/// What the collaborator hands back: extracted text plus a confidence score
/// in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutcome {
    pub text: String,
    pub confidence: f32,
}

/// Client for the Google Cloud Vision `images:annotate` endpoint.
#[derive(Clone, Debug)]
pub struct GoogleVisionClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    message: String,
}

impl GoogleVisionClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| TextliftError::Upstream("API key required for Google Vision".to_string()))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TextliftError::Upstream(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    /// Run text detection on `image_bytes`. Single attempt; provider-side
    /// failures surface as [`TextliftError::Upstream`].
    pub async fn extract(&self, image_bytes: &[u8]) -> Result<OcrOutcome> {
        let request = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image_bytes),
                },
                features: vec![Feature {
                    feature_type: "TEXT_DETECTION".to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/images:annotate", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| TextliftError::Upstream(format!("Vision API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TextliftError::Upstream(format!(
                "Vision API request failed: {status} - {body}"
            )));
        }

        let annotate: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| TextliftError::Upstream(format!("Failed to parse Vision response: {e}")))?;

        let image_response = annotate
            .responses
            .into_iter()
            .next()
            .unwrap_or_default();

        if let Some(status) = image_response.error {
            return Err(TextliftError::Upstream(format!(
                "Vision API error: {}",
                status.message
            )));
        }

        Ok(summarize_annotations(image_response.text_annotations))
    }
}

/// Collapse the annotation list into one outcome: the first annotation holds
/// the full text, the rest are per-block detections whose confidences are
/// averaged. Vision often omits block confidence for TEXT_DETECTION, in
/// which case 0.95 is reported, matching the service's historical behavior.
fn summarize_annotations(annotations: Vec<TextAnnotation>) -> OcrOutcome {
    let Some(full) = annotations.first() else {
        return OcrOutcome {
            text: String::new(),
            confidence: 0.0,
        };
    };

    let text = full.description.trim().to_string();
    let confidences: Vec<f32> = annotations[1..]
        .iter()
        .filter_map(|a| a.confidence)
        .collect();
    let confidence = if confidences.is_empty() {
        0.95
    } else {
        confidences.iter().sum::<f32>() / confidences.len() as f32
    };

    OcrOutcome {
        text,
        confidence: (confidence * 100.0).round() / 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> OcrConfig {
        OcrConfig {
            api_key: None,
            base_url: None,
            timeout_secs: 60,
        }
    }

    fn annotation(description: &str, confidence: Option<f32>) -> TextAnnotation {
        TextAnnotation {
            description: description.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = create_test_config();
        let result = GoogleVisionClient::new(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key required"));
    }

    #[test]
    fn test_client_with_api_key() {
        let mut config = create_test_config();
        config.api_key = Some("test-key".to_string());
        assert!(GoogleVisionClient::new(&config).is_ok());
    }

    #[test]
    fn test_default_base_url() {
        let mut config = create_test_config();
        config.api_key = Some("test-key".to_string());
        let client = GoogleVisionClient::new(&config).unwrap();
        assert!(client.base_url.contains("vision.googleapis.com"));
    }

    #[test]
    fn test_custom_base_url() {
        let mut config = create_test_config();
        config.api_key = Some("test-key".to_string());
        config.base_url = Some("https://custom.api.com".to_string());
        let client = GoogleVisionClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://custom.api.com");
    }

    #[test]
    fn test_summarize_empty_annotations() {
        let outcome = summarize_annotations(vec![]);
        assert_eq!(outcome.text, "");
        assert_eq!(outcome.confidence, 0.0);
    }

    #[test]
    fn test_summarize_averages_block_confidences() {
        let outcome = summarize_annotations(vec![
            annotation("hello world\n", None),
            annotation("hello", Some(0.9)),
            annotation("world", Some(0.8)),
        ]);
        assert_eq!(outcome.text, "hello world");
        assert_eq!(outcome.confidence, 0.85);
    }

    #[test]
    fn test_summarize_defaults_confidence_when_blocks_lack_it() {
        let outcome = summarize_annotations(vec![
            annotation("receipt total 42", None),
            annotation("receipt", None),
        ]);
        assert_eq!(outcome.confidence, 0.95);
    }

    #[test]
    fn test_summarize_rounds_to_two_decimals() {
        let outcome = summarize_annotations(vec![
            annotation("abc", None),
            annotation("a", Some(0.333)),
            annotation("b", Some(0.333)),
            annotation("c", Some(0.333)),
        ]);
        assert_eq!(outcome.confidence, 0.33);
    }
}

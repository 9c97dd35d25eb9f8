use serde::Deserialize;
use std::env;

use crate::ratelimit::LimitSpec;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Parse a comma-separated env var into a lowercase list, falling back to
/// `default` when the variable is unset or empty.
fn parse_env_list(var: &str, default: &[&str]) -> Vec<String> {
    match env::var(var) {
        Ok(val) if !val.trim().is_empty() => val
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}

fn parse_limit_or(var: &str, default: &str) -> LimitSpec {
    let spec = env::var(var).unwrap_or_else(|_| default.to_string());
    match spec.parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Invalid value '{}' for {}: {}. Using default.", spec, var, e);
            default.parse().expect("default limit spec must parse")
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CORS origins. `["*"]` allows any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Limit for `POST /api/extract-text`.
    pub extract: LimitSpec,
    /// Limit for `DELETE /api/cache/clear`.
    pub cache_clear: LimitSpec,
    /// Idle counters older than this are dropped by the janitor.
    pub idle_eviction_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("TEXTLIFT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("TEXTLIFT_PORT", 8080),
                allowed_origins: match env::var("ALLOWED_ORIGINS") {
                    Ok(val) if !val.trim().is_empty() => {
                        val.split(',').map(|s| s.trim().to_string()).collect()
                    }
                    _ => vec!["*".to_string()],
                },
            },
            upload: UploadConfig {
                max_file_size_bytes: parse_env_or::<usize>("MAX_FILE_SIZE_MB", 10) * 1024 * 1024,
                allowed_extensions: parse_env_list(
                    "ALLOWED_EXTENSIONS",
                    &["jpg", "jpeg", "png", "gif"],
                ),
                allowed_content_types: parse_env_list(
                    "ALLOWED_CONTENT_TYPES",
                    &["image/jpeg", "image/jpg", "image/png", "image/gif"],
                ),
            },
            cache: CacheConfig {
                enabled: parse_env_or("CACHE_ENABLED", true),
                ttl_secs: parse_env_or("CACHE_TTL_SECONDS", 3600),
            },
            rate_limit: RateLimitConfig {
                extract: parse_limit_or("RATE_LIMIT_EXTRACT", "1/minute"),
                cache_clear: parse_limit_or("RATE_LIMIT_CACHE_CLEAR", "5/minute"),
                idle_eviction_secs: parse_env_or("RATE_LIMIT_IDLE_EVICTION_SECS", 600),
            },
            ocr: OcrConfig {
                api_key: env::var("OCR_API_KEY").ok(),
                base_url: env::var("OCR_BASE_URL").ok(),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 60),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

use std::sync::Arc;

use crate::cache::ResultCache;
use crate::config::Config;
use crate::ocr::OcrProvider;
use crate::ratelimit::RateLimiter;

/// Shared, read-mostly dependencies. Built once at startup and cloned into
/// every request task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ocr: OcrProvider,
    pub cache: ResultCache,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: Config, ocr: OcrProvider) -> Self {
        let cache = ResultCache::new(&config.cache);
        let limiter = RateLimiter::new();

        Self {
            config: Arc::new(config),
            ocr,
            cache,
            limiter,
        }
    }
}

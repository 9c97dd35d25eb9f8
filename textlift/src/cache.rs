//! Content-addressed cache for OCR results.
//!
//! Keyed by the upload's [`fingerprint`](crate::fingerprint::fingerprint),
//! so re-submitting byte-identical images skips the upstream OCR call
//! entirely for the lifetime of the TTL.
//!
//! The cache is an optimization layer, never a correctness dependency: every
//! operation fails open. A disabled cache answers `get` with a miss, `put`
//! and `clear` with `false`, and `stats` with `enabled: false` — it never
//! produces a request error.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::CacheConfig;

/// A cached OCR result. Immutable once stored; a later `put` for the same
/// fingerprint replaces the whole entry atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub text: String,
    pub confidence: f32,
    pub processing_time_ms: u64,
    /// Always `true` for entries handed back by the cache, so handlers can
    /// return a hit verbatim.
    pub cached: bool,
    pub created_at: DateTime<Utc>,
}

/// Best-effort observability snapshot. Never fails.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entry_count: usize,
    pub ttl_seconds: u64,
}

struct Stored {
    entry: CacheEntry,
    expires_at: Instant,
}

/// Thread-safe TTL cache over a concurrent map. Inserts are whole-entry, so
/// readers never observe a partially written result.
#[derive(Clone)]
pub struct ResultCache {
    entries: Arc<DashMap<String, Stored>>,
    ttl: Duration,
    enabled: bool,
}

impl ResultCache {
    pub fn new(config: &CacheConfig) -> Self {
        if config.enabled {
            info!(ttl_secs = config.ttl_secs, "Result cache enabled");
        } else {
            info!("Result cache disabled - every request will hit the OCR provider");
        }
        Self {
            entries: Arc::new(DashMap::new()),
            ttl: Duration::from_secs(config.ttl_secs),
            enabled: config.enabled,
        }
    }

    /// Look up an unexpired entry for `fingerprint`. Misses, expired entries
    /// and a disabled cache all answer `None`.
    pub fn get(&self, fingerprint: &str) -> Option<CacheEntry> {
        self.get_at(fingerprint, Instant::now())
    }

    /// Store `entry` with the configured TTL, overwriting any previous entry
    /// for the same fingerprint. Returns whether the store happened.
    pub fn put(&self, entry: CacheEntry) -> bool {
        self.put_at(entry, Instant::now())
    }

    /// Drop every entry in this cache. Returns whether the cache was enabled.
    pub fn clear(&self) -> bool {
        if !self.enabled {
            return false;
        }
        let count = self.entries.len();
        self.entries.clear();
        info!(count, "Cleared cached OCR results");
        true
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            entry_count: if self.enabled { self.entries.len() } else { 0 },
            ttl_seconds: self.ttl.as_secs(),
        }
    }

    // Expiry is evaluated against an explicit `now` so tests can simulate
    // TTL passage without sleeping.
    fn get_at(&self, fingerprint: &str, now: Instant) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }
        let expired = match self.entries.get(fingerprint) {
            Some(stored) if stored.expires_at > now => {
                debug!(fingerprint, "Cache hit");
                return Some(stored.entry.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            // Lazy eviction; re-check under the entry lock in case a fresh
            // insert raced us.
            self.entries
                .remove_if(fingerprint, |_, stored| stored.expires_at <= now);
            debug!(fingerprint, "Cache entry expired");
        } else {
            debug!(fingerprint, "Cache miss");
        }
        None
    }

    fn put_at(&self, mut entry: CacheEntry, now: Instant) -> bool {
        if !self.enabled {
            debug!("Cache disabled, store skipped");
            return false;
        }
        // Entries handed back on a hit always carry the cached marker.
        entry.cached = true;
        let fingerprint = entry.fingerprint.clone();
        self.entries.insert(
            fingerprint.clone(),
            Stored {
                entry,
                expires_at: now + self.ttl,
            },
        );
        debug!(fingerprint = %fingerprint, "Cached OCR result");
        true
    }
}

//! Per-client fixed-window rate limiting.
//!
//! Counters live in a concurrent map keyed by client identity, with per-key
//! atomicity from the map's entry API, so concurrent requests from the same
//! identity never lose an increment. The fixed window is intentionally
//! approximate: a client can burst across a window boundary. That is
//! accepted for the endpoints guarded here.

use dashmap::DashMap;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// A maximum request count per fixed time window, e.g. `"1/minute"` or
/// `"5/minute"`. Parsed from the slowapi-style strings the service has
/// always been configured with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LimitSpec {
    pub max_requests: u32,
    pub window: Duration,
}

impl FromStr for LimitSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (count, period) = s
            .split_once('/')
            .ok_or_else(|| format!("expected '<count>/<period>', got '{s}'"))?;
        let max_requests: u32 = count
            .trim()
            .parse()
            .map_err(|e| format!("invalid request count '{count}': {e}"))?;
        if max_requests == 0 {
            return Err("request count must be at least 1".to_string());
        }
        let window = match period.trim().to_lowercase().as_str() {
            "second" => Duration::from_secs(1),
            "minute" => Duration::from_secs(60),
            "hour" => Duration::from_secs(3600),
            other => return Err(format!("unknown period '{other}'")),
        };
        Ok(Self {
            max_requests,
            window,
        })
    }
}

impl std::fmt::Display for LimitSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let period = match self.window.as_secs() {
            1 => "second",
            60 => "minute",
            3600 => "hour",
            _ => return write!(f, "{}/{}s", self.max_requests, self.window.as_secs()),
        };
        write!(f, "{}/{}", self.max_requests, period)
    }
}

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter shared across handlers. Windows are keyed by
/// `(scope, identity)` so each guarded endpoint budgets callers separately.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
        }
    }

    /// Admit or reject a request from `identity` under `spec`. On rejection
    /// returns the number of seconds until the current window rolls over.
    pub fn check(&self, scope: &str, identity: &str, spec: &LimitSpec) -> Result<(), u64> {
        self.check_at(scope, identity, spec, Instant::now())
    }

    /// Drop counters that have been idle longer than `max_idle`. Called
    /// periodically by the janitor task; identities that come back simply
    /// start a fresh window.
    pub fn purge_idle(&self, max_idle: Duration) {
        self.purge_idle_at(max_idle, Instant::now());
    }

    fn check_at(
        &self,
        scope: &str,
        identity: &str,
        spec: &LimitSpec,
        now: Instant,
    ) -> Result<(), u64> {
        let mut window = self
            .windows
            .entry(format!("{scope}:{identity}"))
            .or_insert_with(|| Window {
                started: now,
                count: 0,
            });

        let elapsed = now.duration_since(window.started);
        if elapsed >= spec.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= spec.max_requests {
            let remaining = spec.window.saturating_sub(now.duration_since(window.started));
            // Round up so the client never retries a second too early.
            let retry_after = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            debug!(scope, identity, %spec, retry_after, "Rate limit exceeded");
            return Err(retry_after.max(1));
        }

        window.count += 1;
        Ok(())
    }

    fn purge_idle_at(&self, max_idle: Duration, now: Instant) {
        // Counted inside the closure: the map length can change under us
        // while requests insert fresh windows.
        let mut dropped: usize = 0;
        self.windows.retain(|_, window| {
            let keep = now.duration_since(window.started) < max_idle;
            if !keep {
                dropped += 1;
            }
            keep
        });
        if dropped > 0 {
            debug!(dropped, "Purged idle rate limit windows");
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

//! Freshness tracking for the merged value.

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Whether a value refreshed at `refreshed_at` must be recomputed at `now`.
///
/// Never-populated values and a zero `ttl` are always stale.
pub fn is_stale(refreshed_at: Option<Instant>, ttl: Duration, now: Instant) -> bool {
    match refreshed_at {
        None => true,
        Some(_) if ttl.is_zero() => true,
        Some(at) => match at.checked_add(ttl) {
            Some(expires) => now > expires,
            None => false,
        },
    }
}

/// The merged value together with the time it was produced.
///
/// Replaced as a whole, so a reader never pairs a value with another
/// refresh's timestamp.
#[derive(Debug, Clone, Default)]
pub struct CacheState {
    pub value: Option<Arc<Value>>,
    pub refreshed_at: Option<Instant>,
}

impl CacheState {
    pub fn new(value: Value, refreshed_at: Instant) -> Self {
        Self {
            value: Some(Arc::new(value)),
            refreshed_at: Some(refreshed_at),
        }
    }

    pub fn is_stale(&self, ttl: Duration, now: Instant) -> bool {
        self.value.is_none() || is_stale(self.refreshed_at, ttl, now)
    }

    /// Same value, with the timestamp cleared so the next read refreshes.
    pub fn expired(&self) -> Self {
        Self {
            value: self.value.clone(),
            refreshed_at: None,
        }
    }
}

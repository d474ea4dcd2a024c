//! Cache Entry Module
//!
//! Defines a cached response: the JSON payload returned to the client, the
//! headers captured alongside it, and its expiry.

use std::time::Duration;

use serde_json::Value;

// == Cache Entry ==
/// A memoized successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The exact JSON body previously returned to a client
    pub payload: Value,
    /// Captured response headers, in capture order
    pub headers: Vec<(String, String)>,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` from now.
    pub fn new(payload: Value, headers: Vec<(String, String)>, ttl: Duration) -> Self {
        Self::new_at(payload, headers, ttl, current_timestamp_ms())
    }

    /// Creates a new entry expiring `ttl` after `now_ms`.
    pub fn new_at(
        payload: Value,
        headers: Vec<(String, String)>,
        ttl: Duration,
        now_ms: u64,
    ) -> Self {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        Self {
            payload,
            headers,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks expiry against a clock reading.
    ///
    /// An entry is valid only while the clock is strictly before
    /// `expires_at`.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

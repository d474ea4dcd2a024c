//! Cache Module
//!
//! In-memory response cache: entry store with lazy TTL expiry, the
//! lookup/write middleware and namespace invalidation.

mod entry;
mod invalidation;
pub mod middleware;
mod namespace;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use invalidation::Invalidator;
pub use middleware::response_cache_layer;
pub use namespace::{ExactKey, InvalidationScope, KeyPrefix, Namespace};
pub use shared::{
    CacheSettings, ResponseCache, DEFAULT_CAPTURE_HEADERS, DEFAULT_MAX_BODY_SIZE, DEFAULT_TTL,
};
pub use stats::CacheStats;
pub use store::EntryStore;

// == Public Constants ==
/// Maximum allowed cache key length in bytes
pub const MAX_KEY_LENGTH: usize = 2048;

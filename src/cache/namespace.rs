//! Invalidation scopes
//!
//! A scope decides which cache keys a mutation makes stale. Callers only talk
//! to [`InvalidationScope`], so prefix namespaces can later be swapped for
//! targeted key derivation.

use std::fmt;

/// Something that can tell whether a cache key is affected by a change.
pub trait InvalidationScope: fmt::Debug + Send + Sync {
    fn covers(&self, key: &str) -> bool;
}

// == Namespaces ==
/// Key-prefix groupings invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Product listings, single products, variations and attribute terms
    Products,
    /// Product category listings
    ProductCategories,
    /// Media listings, single media and media-by-category
    Media,
}

impl Namespace {
    /// Namespaces touched by any catalog mutation. Product display depends on
    /// all three.
    pub const CATALOG: &[Namespace] = &[
        Namespace::Products,
        Namespace::ProductCategories,
        Namespace::Media,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Products => "/api/products",
            Namespace::ProductCategories => "/api/product-categories",
            Namespace::Media => "/api/media",
        }
    }
}

impl InvalidationScope for Namespace {
    fn covers(&self, key: &str) -> bool {
        key.starts_with(self.prefix())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

// == Key Prefix ==
/// Keys under a route only known at startup, such as the featured content
/// route that lives under the configured custom namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPrefix(pub String);

impl KeyPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }
}

impl InvalidationScope for KeyPrefix {
    fn covers(&self, key: &str) -> bool {
        key.starts_with(self.0.as_str())
    }
}

// == Exact Key ==
/// A single key, for singleton resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactKey(pub String);

impl ExactKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl InvalidationScope for ExactKey {
    fn covers(&self, key: &str) -> bool {
        key == self.0
    }
}

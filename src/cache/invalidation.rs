//! Invalidator
//!
//! Called by mutation handlers after the upstream accepted the change and
//! before they answer, so a read issued after the response never sees the
//! pre-mutation payload.

use tracing::info;

use crate::cache::{ExactKey, InvalidationScope, KeyPrefix, Namespace, ResponseCache};

#[derive(Debug, Clone)]
pub struct Invalidator {
    cache: ResponseCache,
    /// Cache key of the featured content listing
    featured: KeyPrefix,
}

impl Invalidator {
    /// Invalidator for `cache`. `featured_content_key` is the gateway path
    /// the featured content listing is served (and cached) under.
    pub fn new(cache: ResponseCache, featured_content_key: impl Into<String>) -> Self {
        Self {
            cache,
            featured: KeyPrefix::new(featured_content_key),
        }
    }

    /// A product, variation, category, attribute term or media item changed.
    pub async fn catalog_changed(&self) -> usize {
        let removed = self.cache.invalidate(&catalog_scopes()).await;
        info!(removed, "catalog caches invalidated");
        removed
    }

    /// The featured content selection changed: catalog plus the featured
    /// content listing itself.
    pub async fn featured_content_changed(&self) -> usize {
        let mut scopes: Vec<&dyn InvalidationScope> = catalog_scopes();
        scopes.push(&self.featured);

        let removed = self.cache.invalidate(&scopes).await;
        info!(
            removed,
            featured = %self.featured.0,
            "catalog and featured content caches invalidated"
        );
        removed
    }

    /// A singleton resource changed; drop exactly its key.
    pub async fn singleton_changed(&self, key: &str) -> bool {
        let removed = self.cache.invalidate(&[&ExactKey::new(key)]).await > 0;
        info!(key, removed, "singleton cache invalidated");
        removed
    }
}

/// Product display depends on products, categories and media alike.
fn catalog_scopes() -> Vec<&'static dyn InvalidationScope> {
    Namespace::CATALOG
        .iter()
        .map(|ns| ns as &dyn InvalidationScope)
        .collect()
}

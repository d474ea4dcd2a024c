//! Application state shared across all handlers.

use std::sync::Arc;

use super::handlers::FEATURED_CONTENT_ROUTE;
use crate::cache::{Invalidator, ResponseCache};
use crate::config::{Config, DEFAULT_CUSTOM_NAMESPACE};
use crate::upstream::Upstream;

#[derive(Clone)]
pub struct AppState {
    /// Response cache consulted by the read-route middleware
    pub cache: ResponseCache,
    /// Invalidation entry point for mutation handlers, sharing `cache`'s store
    pub invalidator: Invalidator,
    pub upstream: Arc<dyn Upstream>,
    /// Namespace of the site's custom REST routes, e.g. `titounet/v1`
    pub custom_namespace: Arc<str>,
}

impl AppState {
    pub fn new(cache: ResponseCache, upstream: Arc<dyn Upstream>) -> Self {
        let invalidator = Invalidator::new(
            cache.clone(),
            gateway_path(DEFAULT_CUSTOM_NAMESPACE, FEATURED_CONTENT_ROUTE),
        );
        Self {
            cache,
            invalidator,
            upstream,
            custom_namespace: Arc::from(DEFAULT_CUSTOM_NAMESPACE),
        }
    }

    /// Creates the state from configuration with the given upstream client.
    pub fn from_config(config: &Config, upstream: Arc<dyn Upstream>) -> Self {
        Self::new(ResponseCache::from_config(config), upstream)
            .with_custom_namespace(&config.upstream.custom_namespace)
    }

    /// Moves the custom routes, upstream and gateway side, under `namespace`.
    pub fn with_custom_namespace(mut self, namespace: &str) -> Self {
        self.custom_namespace = Arc::from(namespace.trim_matches('/'));
        self.invalidator = Invalidator::new(self.cache.clone(), self.featured_content_path());
        self
    }

    /// Upstream path of a custom route under the configured namespace.
    pub fn custom_path(&self, route: &str) -> String {
        format!("{}/{}", self.custom_namespace, route.trim_start_matches('/'))
    }

    /// Gateway path of the featured content listing, e.g.
    /// `/api/titounet/v1/featured-instagram`. Also its cache key.
    pub fn featured_content_path(&self) -> String {
        gateway_path(&self.custom_namespace, FEATURED_CONTENT_ROUTE)
    }
}

fn gateway_path(namespace: &str, route: &str) -> String {
    format!("/api/{}/{}", namespace, route.trim_start_matches('/'))
}

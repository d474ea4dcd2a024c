//! Catalog Gateway - a response-caching gateway for a WooCommerce/WordPress
//! storefront API.
//!
//! Read routes are answered from an in-memory TTL cache keyed by request path
//! and query; mutations are forwarded upstream and invalidate the cached
//! namespaces they affect.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;
pub mod upstream;

pub use api::{create_router, AppState};
pub use cache::{Invalidator, ResponseCache};
pub use config::Config;
pub use error::{GatewayError, Result};
pub use tasks::spawn_cleanup_task;
pub use upstream::{HttpUpstream, Upstream};

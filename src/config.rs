//! Configuration Module
//!
//! Handles loading server, cache and upstream configuration from environment
//! variables.

use std::env;

use anyhow::bail;

use crate::cache::{DEFAULT_CAPTURE_HEADERS, DEFAULT_MAX_BODY_SIZE};

/// Namespace of the site's custom REST routes when `WP_CUSTOM_NAMESPACE` is unset.
pub const DEFAULT_CUSTOM_NAMESPACE: &str = "titounet/v1";

/// Environment variables that must be set for the gateway to start.
pub const REQUIRED_VARS: [&str; 6] = [
    "WOO_API_URL",
    "WOO_CONSUMER_KEY",
    "WOO_CONSUMER_SECRET",
    "WP_API_URL",
    "WP_USERNAME",
    "WP_PASSWORD",
];

/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL in seconds for every cached response
    pub default_ttl: u64,
    /// Background expiry sweep interval in seconds, 0 disables the sweep
    pub cleanup_interval: u64,
    /// Largest response body in bytes that will be cached
    pub max_body_size: usize,
    /// Response headers captured on write and replayed on hit
    pub capture_headers: Vec<String>,
    /// Upstream API endpoints and credentials
    pub upstream: UpstreamConfig,
}

/// Commerce (WooCommerce) and content (WordPress) API settings.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the store; `/wp-json/wc/v3` is appended
    pub commerce_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    /// Base URL of the WordPress REST API, including `/wp-json`
    pub content_url: String,
    pub content_username: String,
    pub content_password: String,
    /// Namespace of the site's custom REST routes
    pub custom_namespace: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `WOO_API_URL`, `WOO_CONSUMER_KEY`, `WOO_CONSUMER_SECRET` - commerce API (required)
    /// - `WP_API_URL`, `WP_USERNAME`, `WP_PASSWORD` - content API (required)
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `CACHE_TTL_SECS` - Cache TTL in seconds (default: 21600)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 300, 0 = off)
    /// - `CACHE_MAX_BODY_BYTES` - Largest cacheable body (default: 8 MiB)
    /// - `CACHE_CAPTURE_HEADERS` - Comma-separated header names
    ///   (default: `X-WP-TotalPages,X-WP-Total`)
    /// - `WP_CUSTOM_NAMESPACE` - Custom REST namespace (default: `titounet/v1`)
    /// - `UPSTREAM_TIMEOUT_SECS` - Upstream request timeout (default: 30)
    ///
    /// All missing required variables are reported in one error.
    pub fn from_env() -> anyhow::Result<Self> {
        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| env::var(name).map(|v| v.is_empty()).unwrap_or(true))
            .collect();
        if !missing.is_empty() {
            bail!(
                "missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let defaults = Config::default();

        Ok(Self {
            server_port: parse_var("PORT").unwrap_or(defaults.server_port),
            default_ttl: parse_var("CACHE_TTL_SECS").unwrap_or(defaults.default_ttl),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            max_body_size: parse_var("CACHE_MAX_BODY_BYTES").unwrap_or(defaults.max_body_size),
            capture_headers: env::var("CACHE_CAPTURE_HEADERS")
                .map(|v| parse_header_list(&v))
                .unwrap_or(defaults.capture_headers),
            upstream: UpstreamConfig {
                commerce_url: required_var("WOO_API_URL"),
                consumer_key: required_var("WOO_CONSUMER_KEY"),
                consumer_secret: required_var("WOO_CONSUMER_SECRET"),
                content_url: required_var("WP_API_URL"),
                content_username: required_var("WP_USERNAME"),
                content_password: required_var("WP_PASSWORD"),
                custom_namespace: env::var("WP_CUSTOM_NAMESPACE")
                    .unwrap_or(defaults.upstream.custom_namespace),
                timeout_secs: parse_var("UPSTREAM_TIMEOUT_SECS")
                    .unwrap_or(defaults.upstream.timeout_secs),
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

// Only called after the presence check in `from_env`
fn required_var(name: &str) -> String {
    env::var(name).unwrap_or_default()
}

/// Splits a comma-separated header list, dropping blanks.
pub fn parse_header_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_ttl: 6 * 60 * 60,
            cleanup_interval: 300,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            capture_headers: DEFAULT_CAPTURE_HEADERS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            upstream: UpstreamConfig::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            commerce_url: "http://127.0.0.1:8080".to_string(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            content_url: "http://127.0.0.1:8080/wp-json".to_string(),
            content_username: String::new(),
            content_password: String::new(),
            custom_namespace: DEFAULT_CUSTOM_NAMESPACE.to_string(),
            timeout_secs: 30,
        }
    }
}

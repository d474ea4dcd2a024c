//! Upstream Module
//!
//! The commerce/content API whose responses the gateway caches. Handlers only
//! see the [`Upstream`] trait; [`HttpUpstream`] is the production client.

mod client;

pub use client::HttpUpstream;

use std::convert::Infallible;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponseParts, ResponseParts};
use serde_json::Value;
use thiserror::Error;

use crate::error::GatewayError;

/// Upstream header carrying the number of pages of a listing.
pub const TOTAL_PAGES_HEADER: &str = "X-WP-TotalPages";
/// Upstream header carrying the number of items of a listing.
pub const TOTAL_HEADER: &str = "X-WP-Total";

// == Upstream Trait ==
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Performs one upstream call. Non-success statuses are errors.
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}

/// Which upstream API a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// WooCommerce REST API (`wc/v3`)
    Commerce,
    /// WordPress REST API and the site's custom routes
    Content,
}

/// A file forwarded as a multipart `file` field.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    File(FileUpload),
}

// == Upstream Request ==
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub service: Service,
    pub method: Method,
    /// Path relative to the service base URL, e.g. `products/12/variations`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl UpstreamRequest {
    pub fn new(service: Service, method: Method, path: impl Into<String>) -> Self {
        Self {
            service,
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Method::GET, path)
    }

    pub fn post(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Method::POST, path)
    }

    pub fn put(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Method::PUT, path)
    }

    pub fn delete(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Method::DELETE, path)
    }

    /// Appends query pairs, keeping their order.
    pub fn query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn param(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query([(key, value)])
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn file(mut self, upload: FileUpload) -> Self {
        self.body = RequestBody::File(upload);
        self
    }
}

// == Upstream Response ==
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub body: Value,
    pub pagination: Pagination,
}

impl UpstreamResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            body,
            pagination: Pagination::default(),
        }
    }
}

// == Pagination ==
/// Listing metadata forwarded to clients as response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub total_pages: Option<String>,
    pub total: Option<String>,
}

impl Pagination {
    pub fn new(total_pages: impl Into<String>, total: impl Into<String>) -> Self {
        Self {
            total_pages: Some(total_pages.into()),
            total: Some(total.into()),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        Self {
            total_pages: read(TOTAL_PAGES_HEADER),
            total: read(TOTAL_HEADER),
        }
    }
}

impl IntoResponseParts for Pagination {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let fields = [
            (TOTAL_PAGES_HEADER, self.total_pages),
            (TOTAL_HEADER, self.total),
        ];
        for (name, value) in fields {
            let Some(value) = value else { continue };
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                res.headers_mut().insert(name, value);
            }
        }
        Ok(res)
    }
}

// == Upstream Error ==
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The upstream answered with a non-success status
    #[error("upstream returned {status}")]
    Status { status: StatusCode, details: Value },

    /// Connection, timeout or body decoding failure
    #[error("upstream request failed: {0}")]
    Transport(String),
}

impl UpstreamError {
    /// Turns the failure into a handler error carrying `context` as the
    /// client-facing message.
    pub fn context(self, context: impl Into<String>) -> GatewayError {
        let context = context.into();
        match self {
            UpstreamError::Status { status, details } => GatewayError::Upstream {
                status,
                context,
                details,
            },
            UpstreamError::Transport(message) => GatewayError::Transport { context, message },
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Transport(err.to_string())
    }
}

/// Attaches a client-facing message to upstream failures.
pub trait UpstreamResultExt<T> {
    fn context(self, context: &str) -> crate::error::Result<T>;
}

impl<T> UpstreamResultExt<T> for Result<T, UpstreamError> {
    fn context(self, context: &str) -> crate::error::Result<T> {
        self.map_err(|err| err.context(context))
    }
}

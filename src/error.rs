//! Error types for the gateway
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use thiserror::Error;

use crate::models::ErrorResponse;

// == Gateway Error Enum ==
/// Error returned by request handlers.
///
/// Every variant maps to an HTTP response. None of them ever reaches the
/// response cache: the interceptor only stores 2xx bodies.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The upstream API answered with a non-success status
    #[error("{context}: upstream returned {status}")]
    Upstream {
        status: StatusCode,
        context: String,
        details: Value,
    },

    /// The upstream API could not be reached or its answer could not be read
    #[error("{context}: {message}")]
    Transport { context: String, message: String },

    /// Malformed or missing request input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A resource resolved by the gateway itself does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Cache Error Enum ==
/// Store-level failures. These only disable caching for one response and are
/// never surfaced to clients.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// Key exceeds the maximum key length
    #[error("Cache key exceeds maximum length of {max} bytes (got {len})")]
    KeyTooLong { len: usize, max: usize },

    /// Serialized payload exceeds the configured body limit
    #[error("Payload of {len} bytes exceeds cacheable limit of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    /// An invalidation ran while the response was being produced
    #[error("Response was produced before the latest invalidation")]
    Invalidated,
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            GatewayError::Upstream {
                status,
                context,
                details,
            } => (status, ErrorResponse::new(context).with_details(details)),
            GatewayError::Transport { context, message } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new(context).with_details(Value::String(message)),
            ),
            GatewayError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            GatewayError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg)),
            GatewayError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg))
            }
        };

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upstream_error_keeps_upstream_status() {
        let err = GatewayError::Upstream {
            status: StatusCode::NOT_FOUND,
            context: "Failed to fetch product".to_string(),
            details: json!({ "code": "woocommerce_rest_product_invalid_id" }),
        };

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upstream_error_body_shape() {
        let err = GatewayError::Upstream {
            status: StatusCode::BAD_REQUEST,
            context: "Failed to update product".to_string(),
            details: json!({ "code": "rest_invalid_param" }),
        };

        let bytes = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({
                "error": "Failed to update product",
                "details": { "code": "rest_invalid_param" }
            })
        );
    }

    #[test]
    fn test_transport_error_is_bad_gateway() {
        let err = GatewayError::Transport {
            context: "Failed to fetch articles".to_string(),
            message: "connection refused".to_string(),
        };

        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_invalid_request_is_bad_request() {
        let err = GatewayError::InvalidRequest("note is required".to_string());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::KeyTooLong { len: 5000, max: 2048 };
        assert!(err.to_string().contains("2048"));
    }
}

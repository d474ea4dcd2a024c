//! Response cache middleware.
//!
//! Wraps the designated read routes. A hit answers from the entry store
//! without running the handler; a miss runs the handler and stores its JSON
//! body and captured headers when it succeeded. A stored miss is answered
//! from what was stored, so it carries exactly the headers later hits replay.

use axum::{
    body::{Body, Bytes},
    extract::{OriginalUri, Request, State},
    http::{
        header::{ACCESS_CONTROL_EXPOSE_HEADERS, CONTENT_LENGTH},
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{CacheSettings, ResponseCache};

/// Middleware for response caching, installed with
/// `axum::middleware::from_fn_with_state(cache, response_cache_layer)`.
///
/// Only GET requests are considered. Concurrent misses on the same key are
/// not coalesced: each runs the handler and the last write wins. A miss whose
/// handler was still running when any invalidation happened is served but
/// not stored, so it cannot outlive the mutation that invalidated its key.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = cache_key(&request);

    if let Some(entry) = cache.lookup(&key).await {
        debug!(key = %key, outcome = "hit", "serving cached response");
        return replayed_response(StatusCode::OK, entry.payload, &entry.headers, cache.settings());
    }

    debug!(key = %key, outcome = "miss", "cache miss, executing handler");

    let generation = cache.generation();
    let response = next.run(request).await;

    // Failures are passed through untouched and never stored
    if !response.status().is_success() {
        return response;
    }

    let settings = cache.settings();
    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            // Hand the client the same failing body it would get uncached
            warn!(key = %key, error = %err, "failed to read handler response body, not cached");
            parts.headers.remove(CONTENT_LENGTH);
            let failed = futures::stream::once(async move { Err::<Bytes, _>(err) });
            return Response::from_parts(parts, Body::from_stream(failed));
        }
    };

    if let Some(payload) = cacheable_payload(&key, &bytes, settings) {
        let captured = capture_headers(&parts.headers, &settings.capture_headers);
        match cache
            .insert_since(generation, key.clone(), payload.clone(), captured.clone())
            .await
        {
            Ok(()) => {
                debug!(key = %key, "response cached");
                return replayed_response(parts.status, payload, &captured, settings);
            }
            Err(err) => warn!(key = %key, error = %err, "response not cached"),
        }
    }

    set_expose_header(&mut parts.headers, settings);
    Response::from_parts(parts, Body::from(bytes))
}

/// The JSON payload to store, or `None` when the body must not be cached.
fn cacheable_payload(key: &str, bytes: &Bytes, settings: &CacheSettings) -> Option<Value> {
    if let Err(err) = settings.check_body_size(bytes.len()) {
        warn!(key = %key, error = %err, "response not cached");
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(payload) => Some(payload),
        Err(_) => {
            debug!(key = %key, "response body is not JSON, not cached");
            None
        }
    }
}

/// Path plus raw query string exactly as received. Parameter order is not
/// normalized, so `?a=1&b=2` and `?b=2&a=1` are distinct keys.
pub fn cache_key(request: &Request) -> String {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| request.uri());

    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Read back the configured headers from an in-flight response.
fn capture_headers(headers: &HeaderMap, names: &[String]) -> Vec<(String, String)> {
    names
        .iter()
        .filter_map(|name| {
            let value = headers.get(name.as_str())?.to_str().ok()?;
            (!value.is_empty()).then(|| (name.clone(), value.to_string()))
        })
        .collect()
}

fn set_expose_header(headers: &mut HeaderMap, settings: &CacheSettings) {
    if settings.capture_headers.is_empty() {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(&settings.expose_headers_value()) {
        headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, value);
    }
}

/// Build a JSON response from a payload and its captured headers.
fn replayed_response(
    status: StatusCode,
    payload: Value,
    captured: &[(String, String)],
    settings: &CacheSettings,
) -> Response {
    let mut headers = HeaderMap::new();

    for (name, value) in captured {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "skipping cached header that is not a valid header"),
        }
    }
    set_expose_header(&mut headers, settings);

    (status, headers, Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::cache::Namespace;

    use axum::{
        http::StatusCode,
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use serde_json::json;
    use tower::util::ServiceExt;

    fn counting_app(cache: ResponseCache, status: StatusCode, calls: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/items",
                get(move || {
                    let calls = calls.clone();
                    async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                        (
                            status,
                            [("X-WP-TotalPages", "3"), ("X-WP-Total", "42")],
                            Json(json!({ "call": n })),
                        )
                    }
                })
                .post(|| async { Json(json!({ "created": true })) }),
            )
            .route("/text", get(|| async { "plain text" }))
            .route_layer(from_fn_with_state(cache, response_cache_layer))
    }

    async fn send(app: &Router, method: &str, uri: &str) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_hit_skips_handler_and_replays_headers() {
        let cache = ResponseCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(cache.clone(), StatusCode::OK, calls.clone());

        let first = send(&app, "GET", "/items?page=1").await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            first.headers()[ACCESS_CONTROL_EXPOSE_HEADERS],
            "X-WP-TotalPages, X-WP-Total"
        );
        assert_eq!(body_json(first).await, json!({ "call": 1 }));

        let second = send(&app, "GET", "/items?page=1").await;
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers()["x-wp-totalpages"], "3");
        assert_eq!(second.headers()["x-wp-total"], "42");
        assert_eq!(
            second.headers()[ACCESS_CONTROL_EXPOSE_HEADERS],
            "X-WP-TotalPages, X-WP-Total"
        );
        assert_eq!(body_json(second).await, json!({ "call": 1 }));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn test_failed_response_is_not_cached() {
        let cache = ResponseCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(cache.clone(), StatusCode::INTERNAL_SERVER_ERROR, calls.clone());

        let response = send(&app, "GET", "/items").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        send(&app, "GET", "/items").await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_query_order_produces_distinct_keys() {
        let cache = ResponseCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(cache.clone(), StatusCode::OK, calls.clone());

        send(&app, "GET", "/items?a=1&b=2").await;
        send(&app, "GET", "/items?b=2&a=1").await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.contains("/items?a=1&b=2").await);
        assert!(cache.contains("/items?b=2&a=1").await);
    }

    #[tokio::test]
    async fn test_non_get_requests_bypass_cache() {
        let cache = ResponseCache::default();
        let app = counting_app(cache.clone(), StatusCode::OK, Arc::new(AtomicUsize::new(0)));

        let response = send(&app, "POST", "/items").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_non_json_body_is_delivered_but_not_cached() {
        let cache = ResponseCache::default();
        let app = counting_app(cache.clone(), StatusCode::OK, Arc::new(AtomicUsize::new(0)));

        let response = send(&app, "GET", "/text").await;
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        assert_eq!(&bytes[..], b"plain text");
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_oversized_body_is_delivered_but_not_cached() {
        let cache = ResponseCache::new(CacheSettings {
            max_body_size: 4,
            ..CacheSettings::default()
        });
        let app = counting_app(cache.clone(), StatusCode::OK, Arc::new(AtomicUsize::new(0)));

        let response = send(&app, "GET", "/items").await;
        assert_eq!(body_json(response).await, json!({ "call": 1 }));
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_miss_carries_only_the_headers_a_hit_replays() {
        let cache = ResponseCache::new(CacheSettings {
            capture_headers: vec!["X-WP-Total".to_string()],
            ..CacheSettings::default()
        });
        let app = counting_app(cache.clone(), StatusCode::OK, Arc::new(AtomicUsize::new(0)));

        let miss = send(&app, "GET", "/items").await;
        let hit = send(&app, "GET", "/items").await;

        for response in [&miss, &hit] {
            assert_eq!(response.headers()["x-wp-total"], "42");
            assert!(response.headers().get("x-wp-totalpages").is_none());
            assert_eq!(response.headers()[ACCESS_CONTROL_EXPOSE_HEADERS], "X-WP-Total");
        }
        assert_eq!(body_json(miss).await, body_json(hit).await);
    }

    #[tokio::test]
    async fn test_body_read_failure_reaches_client_unchanged() {
        let cache = ResponseCache::default();
        let app = Router::new()
            .route(
                "/broken",
                get(|| async {
                    let failing = futures::stream::once(async {
                        Err::<Bytes, _>(std::io::Error::new(
                            std::io::ErrorKind::Other,
                            "connection reset",
                        ))
                    });
                    Body::from_stream(failing)
                }),
            )
            .route_layer(from_fn_with_state(cache.clone(), response_cache_layer));

        let response = send(&app, "GET", "/broken").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(axum::body::to_bytes(response.into_body(), usize::MAX).await.is_err());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_miss_racing_an_invalidation_is_not_stored() {
        let cache = ResponseCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let handler_cache = cache.clone();
        let handler_calls = calls.clone();
        let app = Router::new()
            .route(
                "/items",
                get(move || {
                    let cache = handler_cache.clone();
                    let calls = handler_calls.clone();
                    async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                        // A mutation lands while the upstream call is in flight
                        if n == 1 {
                            cache.invalidate(&[&Namespace::Products]).await;
                        }
                        Json(json!({ "call": n }))
                    }
                }),
            )
            .route_layer(from_fn_with_state(cache.clone(), response_cache_layer));

        let first = send(&app, "GET", "/items").await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(body_json(first).await, json!({ "call": 1 }));
        assert!(cache.is_empty().await);

        let second = send(&app, "GET", "/items").await;
        assert_eq!(body_json(second).await, json!({ "call": 2 }));
        assert!(cache.contains("/items").await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_capture_headers_skips_missing_and_empty() {
        let mut headers = HeaderMap::new();
        headers.insert("x-wp-total", HeaderValue::from_static("7"));
        headers.insert("x-wp-totalpages", HeaderValue::from_static(""));
        let names = vec!["X-WP-TotalPages".to_string(), "X-WP-Total".to_string()];

        assert_eq!(
            capture_headers(&headers, &names),
            vec![("X-WP-Total".to_string(), "7".to_string())]
        );
    }

    #[test]
    fn test_cache_key_keeps_raw_query() {
        let request = Request::builder()
            .uri("/api/products?per_page=12&page=2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(cache_key(&request), "/api/products?per_page=12&page=2");
    }
}

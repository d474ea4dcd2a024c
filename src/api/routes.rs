//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_attribute_term, create_product, create_variation, delete_attribute_term,
    delete_media, delete_product, delete_variation, featured_products, get_article,
    get_featured_content, get_media, get_order_note, get_page, get_product, health_handler,
    list_articles, list_attribute_terms, list_categories, list_media, list_media_categories,
    list_products, list_variations, media_by_category, stats_handler, update_category,
    update_featured_content, update_media_categories, update_order_note, update_product,
    update_variation, upload_media,
};
use super::AppState;
use crate::cache::response_cache_layer;

/// Largest accepted media upload.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Creates the main router with all endpoints configured.
///
/// GET routes registered in `cached_routes` go through the response cache.
/// Mutations, health and statistics never do.
///
/// # Middleware
/// - CORS: Allows any origin, method and header
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    cached_routes(&state)
        .merge(mutation_routes(&state))
        .route("/health", get(health_handler))
        .route("/api/cache/stats", get(stats_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cached_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/featured", get(featured_products))
        .route("/api/products/:id", get(get_product))
        .route("/api/products/:id/variations", get(list_variations))
        .route(
            "/api/products/attributes/:attribute_id/terms",
            get(list_attribute_terms),
        )
        .route("/api/product-categories", get(list_categories))
        .route("/api/media", get(list_media))
        .route("/api/media/:id", get(get_media))
        .route("/api/media/category/:slug", get(media_by_category))
        .route("/api/media_category", get(list_media_categories))
        .route("/api/articles", get(list_articles))
        .route("/api/articles/:id", get(get_article))
        .route("/api/pages/:id", get(get_page))
        .route(&state.featured_content_path(), get(get_featured_content))
        .route("/api/settings/order-summary-note", get(get_order_note))
        .route_layer(middleware::from_fn_with_state(
            state.cache.clone(),
            response_cache_layer,
        ))
}

fn mutation_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/products", post(create_product))
        .route("/api/products/:id", put(update_product).delete(delete_product))
        .route("/api/products/:id/variations", post(create_variation))
        .route(
            "/api/products/:id/variations/:variation_id",
            put(update_variation).delete(delete_variation),
        )
        .route(
            "/api/products/attributes/:attribute_id/terms",
            post(create_attribute_term),
        )
        .route(
            "/api/products/attributes/:attribute_id/terms/:term_id",
            delete(delete_attribute_term),
        )
        .route("/api/product-categories/:id", put(update_category))
        .route(
            "/api/media",
            post(upload_media).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/media/:id", put(update_media_categories).delete(delete_media))
        .route(&state.featured_content_path(), post(update_featured_content))
        .route("/api/settings/order-summary-note", post(update_order_note))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{state_with, RecordingUpstream};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(state_with(RecordingUpstream::new()));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint_is_not_cached() {
        let state = state_with(RecordingUpstream::new());
        let app = create_router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/cache/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cached_get_and_uncached_post_share_a_path() {
        let upstream = RecordingUpstream::new();
        upstream.respond("products", json!([]));
        let state = state_with(upstream.clone());
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/products")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.cache.contains("/api/products").await);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/products")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"Poster"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(state.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_static_segments_win_over_ids() {
        let upstream = RecordingUpstream::new();
        upstream.respond("wp/v2/attachment_category", json!([]));
        let app = create_router(state_with(upstream.clone()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/media/category/prints")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "media category 'prints' not found" })
        );
    }

    #[tokio::test]
    async fn test_featured_content_served_under_custom_namespace() {
        let upstream = RecordingUpstream::new();
        upstream.respond("shop/v2/featured-instagram", json!({ "post_ids": [3] }));
        let state = state_with(upstream.clone()).with_custom_namespace("shop/v2");
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/shop/v2/featured-instagram")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.cache.contains("/api/shop/v2/featured-instagram").await);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/shop/v2/featured-instagram")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"post_ids":[3,4]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.cache.is_empty().await);
        assert_eq!(upstream.calls_to("shop/v2/featured-instagram").len(), 2);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let upstream = RecordingUpstream::new();
        let app = create_router(state_with(upstream.clone()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/products/abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(upstream.calls().is_empty());
    }
}

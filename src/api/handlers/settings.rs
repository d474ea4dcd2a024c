//! Site settings handlers: the featured content selection and the order
//! summary note, both served by the site's custom REST namespace.

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};

use super::ForwardedQuery;
use crate::api::AppState;
use crate::error::{GatewayError, Result};
use crate::models::{FeaturedContentRequest, OrderNoteRequest};
use crate::upstream::{Service, UpstreamRequest, UpstreamResultExt};

/// Cache key of the order summary note, invalidated on its own.
pub const ORDER_NOTE_KEY: &str = "/api/settings/order-summary-note";

/// Custom route of the featured content selection, served by the gateway
/// under the same namespace as upstream.
pub const FEATURED_CONTENT_ROUTE: &str = "featured-instagram";
const ORDER_NOTE_ROUTE: &str = "admin/options/order-summary-note";

/// GET /api/{namespace}/featured-instagram
pub async fn get_featured_content(
    State(state): State<AppState>,
    Query(query): Query<ForwardedQuery>,
) -> Result<Json<Value>> {
    let response = state
        .upstream
        .send(
            UpstreamRequest::get(Service::Content, state.custom_path(FEATURED_CONTENT_ROUTE))
                .query(query),
        )
        .await
        .context("Failed to fetch featured content")?;

    Ok(Json(response.body))
}

/// POST /api/{namespace}/featured-instagram
pub async fn update_featured_content(
    State(state): State<AppState>,
    Json(request): Json<FeaturedContentRequest>,
) -> Result<Json<Value>> {
    if let Some(error_msg) = request.validate() {
        return Err(GatewayError::InvalidRequest(error_msg));
    }

    let response = state
        .upstream
        .send(
            UpstreamRequest::post(Service::Content, state.custom_path(FEATURED_CONTENT_ROUTE))
                .json(json!({ "post_ids": request.post_ids })),
        )
        .await
        .context("Failed to update featured content")?;

    state.invalidator.featured_content_changed().await;
    Ok(Json(response.body))
}

/// GET /api/settings/order-summary-note
pub async fn get_order_note(State(state): State<AppState>) -> Result<Json<Value>> {
    let response = state
        .upstream
        .send(UpstreamRequest::get(Service::Content, state.custom_path(ORDER_NOTE_ROUTE)))
        .await
        .context("Failed to fetch order summary note")?;

    Ok(Json(response.body))
}

/// POST /api/settings/order-summary-note
pub async fn update_order_note(
    State(state): State<AppState>,
    Json(request): Json<OrderNoteRequest>,
) -> Result<Json<Value>> {
    if let Some(error_msg) = request.validate() {
        return Err(GatewayError::InvalidRequest(error_msg));
    }

    let response = state
        .upstream
        .send(
            UpstreamRequest::post(Service::Content, state.custom_path(ORDER_NOTE_ROUTE))
                .json(json!({ "note": request.note })),
        )
        .await
        .context("Failed to update order summary note")?;

    state.invalidator.singleton_changed(ORDER_NOTE_KEY).await;
    Ok(Json(response.body))
}

//! Article and page handlers (content API).

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use super::{parse_id, ForwardedQuery};
use crate::api::AppState;
use crate::error::Result;
use crate::upstream::{Pagination, Service, UpstreamRequest, UpstreamResultExt};

/// GET /api/articles
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ForwardedQuery>,
) -> Result<(Pagination, Json<Value>)> {
    let response = state
        .upstream
        .send(UpstreamRequest::get(Service::Content, "wp/v2/posts").query(query))
        .await
        .context("Failed to fetch articles")?;

    Ok((response.pagination, Json(response.body)))
}

/// GET /api/articles/:id
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ForwardedQuery>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "article")?;
    let response = state
        .upstream
        .send(UpstreamRequest::get(Service::Content, format!("wp/v2/posts/{}", id)).query(query))
        .await
        .context("Failed to fetch article")?;

    Ok(Json(response.body))
}

/// GET /api/pages/:id
pub async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ForwardedQuery>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "page")?;
    let response = state
        .upstream
        .send(UpstreamRequest::get(Service::Content, format!("wp/v2/pages/{}", id)).query(query))
        .await
        .context("Failed to fetch page")?;

    Ok(Json(response.body))
}

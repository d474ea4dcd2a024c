//! Media library handlers (content API).

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::{parse_id, ForwardedQuery};
use crate::api::AppState;
use crate::error::{GatewayError, Result};
use crate::models::MediaCategoriesRequest;
use crate::upstream::{FileUpload, Pagination, Service, UpstreamRequest, UpstreamResultExt};

const MEDIA_PATH: &str = "wp/v2/media";
const MEDIA_CATEGORY_PATH: &str = "wp/v2/attachment_category";

/// Multipart field holding the uploaded file.
const UPLOAD_FIELD: &str = "file";

/// GET /api/media
pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<ForwardedQuery>,
) -> Result<(Pagination, Json<Value>)> {
    let response = state
        .upstream
        .send(UpstreamRequest::get(Service::Content, MEDIA_PATH).query(query))
        .await
        .context("Failed to fetch media")?;

    Ok((response.pagination, Json(response.body)))
}

/// GET /api/media/:id
pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ForwardedQuery>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "media")?;
    let response = state
        .upstream
        .send(UpstreamRequest::get(Service::Content, format!("{}/{}", MEDIA_PATH, id)).query(query))
        .await
        .context("Failed to fetch media item")?;

    Ok(Json(response.body))
}

/// POST /api/media
///
/// Forwards the multipart `file` field as-is.
pub async fn upload_media(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>)> {
    let upload = read_upload(multipart)
        .await?
        .ok_or_else(|| GatewayError::InvalidRequest("no file provided".to_string()))?;

    let response = state
        .upstream
        .send(UpstreamRequest::post(Service::Content, MEDIA_PATH).file(upload))
        .await
        .context("Failed to upload media")?;

    state.invalidator.catalog_changed().await;
    Ok((StatusCode::CREATED, Json(response.body)))
}

/// PUT /api/media/:id
///
/// Replaces the media item's categories with `attachment_category`.
pub async fn update_media_categories(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MediaCategoriesRequest>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "media")?;
    if let Some(error_msg) = request.validate() {
        return Err(GatewayError::InvalidRequest(error_msg));
    }

    // WordPress updates media with POST
    let response = state
        .upstream
        .send(
            UpstreamRequest::post(Service::Content, format!("{}/{}", MEDIA_PATH, id))
                .json(json!({ "attachment_category": request.attachment_category })),
        )
        .await
        .context("Failed to update media categories")?;

    state.invalidator.catalog_changed().await;
    Ok(Json(response.body))
}

/// DELETE /api/media/:id
pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "media")?;
    let response = state
        .upstream
        .send(
            UpstreamRequest::delete(Service::Content, format!("{}/{}", MEDIA_PATH, id))
                .param("force", "true"),
        )
        .await
        .context("Failed to delete media")?;

    state.invalidator.catalog_changed().await;
    Ok(Json(response.body))
}

/// GET /api/media_category
pub async fn list_media_categories(
    State(state): State<AppState>,
    Query(query): Query<ForwardedQuery>,
) -> Result<(Pagination, Json<Value>)> {
    let response = state
        .upstream
        .send(UpstreamRequest::get(Service::Content, MEDIA_CATEGORY_PATH).query(query))
        .await
        .context("Failed to fetch media categories")?;

    Ok((response.pagination, Json(response.body)))
}

/// GET /api/media/category/:slug
///
/// Media filed under the category `slug` or any of its direct children.
pub async fn media_by_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ForwardedQuery>,
) -> Result<(Pagination, Json<Value>)> {
    const CONTEXT: &str = "Failed to fetch media by category";

    let parents = state
        .upstream
        .send(UpstreamRequest::get(Service::Content, MEDIA_CATEGORY_PATH).param("slug", &slug))
        .await
        .context(CONTEXT)?;
    let parent_id = category_ids(&parents.body)
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::NotFound(format!("media category '{}' not found", slug)))?;

    let children = state
        .upstream
        .send(
            UpstreamRequest::get(Service::Content, MEDIA_CATEGORY_PATH)
                .param("parent", parent_id.to_string())
                .param("per_page", "100"),
        )
        .await
        .context(CONTEXT)?;

    let ids: Vec<String> = std::iter::once(parent_id)
        .chain(category_ids(&children.body))
        .map(|id| id.to_string())
        .collect();

    let response = state
        .upstream
        .send(
            UpstreamRequest::get(Service::Content, MEDIA_PATH)
                .param("attachment_category", ids.join(","))
                .query(query),
        )
        .await
        .context(CONTEXT)?;

    Ok((response.pagination, Json(response.body)))
}

fn category_ids(categories: &Value) -> Vec<u64> {
    categories
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|category| category.get("id").and_then(Value::as_u64))
                .collect()
        })
        .unwrap_or_default()
}

async fn read_upload(mut multipart: Multipart) -> Result<Option<FileUpload>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| GatewayError::InvalidRequest(err.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or(UPLOAD_FIELD).to_string();
        let content_type = field.content_type().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| GatewayError::InvalidRequest(err.body_text()))?;

        return Ok(Some(FileUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }

    Ok(None)
}

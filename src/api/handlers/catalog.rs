//! Product, variation, attribute term and product category handlers.
//!
//! All of them talk to the commerce API. Every successful mutation clears the
//! catalog namespaces before the response is returned.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::warn;

use super::{parse_id, ForwardedQuery};
use crate::api::AppState;
use crate::error::Result;
use crate::models::DeleteQuery;
use crate::upstream::{Pagination, Service, Upstream, UpstreamRequest, UpstreamResultExt};

/// Variations requested for a single product page.
const VARIATIONS_PER_PAGE: &str = "50";

// == Products ==

/// GET /api/products
///
/// Variable products get their `price` and `price_html` derived from their
/// variations, fetched concurrently.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ForwardedQuery>,
) -> Result<(Pagination, Json<Value>)> {
    let response = state
        .upstream
        .send(UpstreamRequest::get(Service::Commerce, "products").query(query))
        .await
        .context("Failed to fetch products")?;

    let body = match response.body {
        Value::Array(products) => {
            let upstream = state.upstream.as_ref();
            let enhanced = join_all(
                products
                    .into_iter()
                    .map(|product| with_display_price(upstream, product)),
            )
            .await;
            Value::Array(enhanced)
        }
        other => other,
    };

    Ok((response.pagination, Json(body)))
}

/// GET /api/products/featured
pub async fn featured_products(
    State(state): State<AppState>,
    Query(query): Query<ForwardedQuery>,
) -> Result<(Pagination, Json<Value>)> {
    let response = state
        .upstream
        .send(
            UpstreamRequest::get(Service::Commerce, "products")
                .param("featured", "true")
                .query(query),
        )
        .await
        .context("Failed to fetch featured products")?;

    Ok((response.pagination, Json(response.body)))
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ForwardedQuery>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "product")?;
    let response = state
        .upstream
        .send(UpstreamRequest::get(Service::Commerce, format!("products/{}", id)).query(query))
        .await
        .context("Failed to fetch product")?;

    Ok(Json(response.body))
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(product): Json<Value>,
) -> Result<(StatusCode, Json<Value>)> {
    let response = state
        .upstream
        .send(UpstreamRequest::post(Service::Commerce, "products").json(product))
        .await
        .context("Failed to create product")?;

    state.invalidator.catalog_changed().await;
    Ok((StatusCode::CREATED, Json(response.body)))
}

/// PUT /api/products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(product): Json<Value>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "product")?;
    let response = state
        .upstream
        .send(UpstreamRequest::put(Service::Commerce, format!("products/{}", id)).json(product))
        .await
        .context("Failed to update product")?;

    state.invalidator.catalog_changed().await;
    Ok(Json(response.body))
}

/// DELETE /api/products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "product")?;
    let response = state
        .upstream
        .send(
            UpstreamRequest::delete(Service::Commerce, format!("products/{}", id))
                .param("force", "true"),
        )
        .await
        .context("Failed to delete product")?;

    state.invalidator.catalog_changed().await;
    Ok(Json(response.body))
}

// == Variations ==

/// GET /api/products/:id/variations
pub async fn list_variations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(Pagination, Json<Value>)> {
    let id = parse_id(&id, "product")?;
    let response = state
        .upstream
        .send(
            UpstreamRequest::get(Service::Commerce, format!("products/{}/variations", id))
                .param("per_page", VARIATIONS_PER_PAGE),
        )
        .await
        .context(&format!("Failed to fetch variations for product {}", id))?;

    Ok((response.pagination, Json(response.body)))
}

/// POST /api/products/:id/variations
pub async fn create_variation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(variation): Json<Value>,
) -> Result<(StatusCode, Json<Value>)> {
    let id = parse_id(&id, "product")?;
    let response = state
        .upstream
        .send(
            UpstreamRequest::post(Service::Commerce, format!("products/{}/variations", id))
                .json(variation),
        )
        .await
        .context(&format!("Failed to create variation for product {}", id))?;

    state.invalidator.catalog_changed().await;
    Ok((StatusCode::CREATED, Json(response.body)))
}

/// PUT /api/products/:id/variations/:variation_id
pub async fn update_variation(
    State(state): State<AppState>,
    Path((id, variation_id)): Path<(String, String)>,
    Json(variation): Json<Value>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "product")?;
    let variation_id = parse_id(&variation_id, "variation")?;
    let response = state
        .upstream
        .send(
            UpstreamRequest::put(
                Service::Commerce,
                format!("products/{}/variations/{}", id, variation_id),
            )
            .json(variation),
        )
        .await
        .context(&format!(
            "Failed to update variation {} for product {}",
            variation_id, id
        ))?;

    state.invalidator.catalog_changed().await;
    Ok(Json(response.body))
}

/// DELETE /api/products/:id/variations/:variation_id
///
/// Moves the variation to the trash unless `?force=true` is given.
pub async fn delete_variation(
    State(state): State<AppState>,
    Path((id, variation_id)): Path<(String, String)>,
    Query(params): Query<DeleteQuery>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "product")?;
    let variation_id = parse_id(&variation_id, "variation")?;
    let response = state
        .upstream
        .send(
            UpstreamRequest::delete(
                Service::Commerce,
                format!("products/{}/variations/{}", id, variation_id),
            )
            .param("force", params.is_forced().to_string()),
        )
        .await
        .context(&format!(
            "Failed to delete variation {} for product {}",
            variation_id, id
        ))?;

    state.invalidator.catalog_changed().await;
    Ok(Json(response.body))
}

// == Attribute Terms ==

/// GET /api/products/attributes/:attribute_id/terms
pub async fn list_attribute_terms(
    State(state): State<AppState>,
    Path(attribute_id): Path<String>,
    Query(query): Query<ForwardedQuery>,
) -> Result<(Pagination, Json<Value>)> {
    let attribute_id = parse_id(&attribute_id, "attribute")?;
    let response = state
        .upstream
        .send(
            UpstreamRequest::get(
                Service::Commerce,
                format!("products/attributes/{}/terms", attribute_id),
            )
            .query(query),
        )
        .await
        .context(&format!(
            "Failed to fetch terms for attribute {}",
            attribute_id
        ))?;

    Ok((response.pagination, Json(response.body)))
}

/// POST /api/products/attributes/:attribute_id/terms
pub async fn create_attribute_term(
    State(state): State<AppState>,
    Path(attribute_id): Path<String>,
    Json(term): Json<Value>,
) -> Result<(StatusCode, Json<Value>)> {
    let attribute_id = parse_id(&attribute_id, "attribute")?;
    let response = state
        .upstream
        .send(
            UpstreamRequest::post(
                Service::Commerce,
                format!("products/attributes/{}/terms", attribute_id),
            )
            .json(term),
        )
        .await
        .context(&format!(
            "Failed to create term for attribute {}",
            attribute_id
        ))?;

    state.invalidator.catalog_changed().await;
    Ok((StatusCode::CREATED, Json(response.body)))
}

/// DELETE /api/products/attributes/:attribute_id/terms/:term_id
pub async fn delete_attribute_term(
    State(state): State<AppState>,
    Path((attribute_id, term_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let attribute_id = parse_id(&attribute_id, "attribute")?;
    let term_id = parse_id(&term_id, "term")?;
    let response = state
        .upstream
        .send(
            UpstreamRequest::delete(
                Service::Commerce,
                format!("products/attributes/{}/terms/{}", attribute_id, term_id),
            )
            .param("force", "true"),
        )
        .await
        .context("Failed to delete term")?;

    state.invalidator.catalog_changed().await;
    Ok(Json(response.body))
}

// == Product Categories ==

/// GET /api/product-categories
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ForwardedQuery>,
) -> Result<(Pagination, Json<Value>)> {
    let response = state
        .upstream
        .send(UpstreamRequest::get(Service::Commerce, "products/categories").query(query))
        .await
        .context("Failed to fetch product categories")?;

    Ok((response.pagination, Json(response.body)))
}

/// PUT /api/product-categories/:id
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(category): Json<Value>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "category")?;
    let response = state
        .upstream
        .send(
            UpstreamRequest::put(Service::Commerce, format!("products/categories/{}", id))
                .json(category),
        )
        .await
        .context("Failed to update product category")?;

    state.invalidator.catalog_changed().await;
    Ok(Json(response.body))
}

// == Display Price ==

/// Fills `price_html` for a listed product. Variable products are priced from
/// their variations: a single price, or "À partir de {min} €" for a range. A
/// product whose variations cannot be priced ends up with `price: null` and an
/// empty `price_html`.
async fn with_display_price(upstream: &dyn Upstream, mut product: Value) -> Value {
    let is_variable = product.get("type").and_then(Value::as_str) == Some("variable");
    let product_id = product.get("id").and_then(Value::as_u64);

    let Some(fields) = product.as_object_mut() else {
        return product;
    };

    if !is_variable {
        let price_html = match fields.get("price") {
            Some(Value::String(price)) if !price.is_empty() => format!("{} €", price),
            Some(Value::Number(price)) => format!("{} €", price),
            _ => String::new(),
        };
        fields.insert("price_html".to_string(), Value::String(price_html));
        return product;
    }

    let range = match product_id {
        Some(id) => variation_price_range(upstream, id).await,
        None => None,
    };

    match range {
        Some((min, max)) => {
            let price_html = if min == max {
                format!("{} €", min)
            } else {
                format!("À partir de {} €", min)
            };
            fields.insert("price".to_string(), price_value(min));
            fields.insert("price_html".to_string(), Value::String(price_html));
        }
        None => {
            fields.insert("price".to_string(), Value::Null);
            fields.insert("price_html".to_string(), json!(""));
        }
    }

    product
}

/// Lowest and highest parseable variation price.
async fn variation_price_range(upstream: &dyn Upstream, product_id: u64) -> Option<(f64, f64)> {
    let request =
        UpstreamRequest::get(Service::Commerce, format!("products/{}/variations", product_id));
    let variations = match upstream.send(request).await {
        Ok(response) => response.body,
        Err(err) => {
            warn!(product_id, error = %err, "failed to fetch variations for pricing");
            return None;
        }
    };

    price_range(variations.as_array()?.iter().filter_map(variation_price))
}

fn variation_price(variation: &Value) -> Option<f64> {
    let price: f64 = match variation.get("price")? {
        Value::String(price) => price.trim().parse().ok()?,
        Value::Number(price) => price.as_f64()?,
        _ => return None,
    };
    price.is_finite().then_some(price)
}

fn price_range(prices: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    prices.fold(None, |range, price| match range {
        None => Some((price, price)),
        Some((min, max)) => Some((min.min(price), max.max(price))),
    })
}

/// Whole prices serialize as integers, `12` rather than `12.0`.
fn price_value(price: f64) -> Value {
    if price.fract() == 0.0 && price.abs() < i64::MAX as f64 {
        json!(price as i64)
    } else {
        json!(price)
    }
}

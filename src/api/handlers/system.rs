//! Health and cache statistics endpoints. Never cached.

use axum::{extract::State, Json};

use crate::api::AppState;
use crate::models::{HealthResponse, StatsResponse};

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// GET /api/cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats().await))
}

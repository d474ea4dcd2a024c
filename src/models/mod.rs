//! Request and response bodies owned by the gateway.
//!
//! Upstream payloads pass through as `serde_json::Value`; only the inputs the
//! gateway validates itself and its own endpoints get typed DTOs.

pub mod requests;
pub mod responses;

pub use requests::{DeleteQuery, FeaturedContentRequest, MediaCategoriesRequest, OrderNoteRequest};
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};

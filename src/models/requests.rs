//! Request DTOs
//!
//! Inputs checked before any upstream call is made. Each `validate` returns
//! the client-facing message on failure.

use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /api/settings/order-summary-note`
#[derive(Debug, Clone, Deserialize)]
pub struct OrderNoteRequest {
    #[serde(default)]
    pub note: Option<String>,
}

impl OrderNoteRequest {
    pub fn validate(&self) -> Option<String> {
        match self.note.as_deref() {
            Some(note) if !note.is_empty() => None,
            _ => Some("note is required".to_string()),
        }
    }
}

/// Body of `POST /api/{namespace}/featured-instagram`
#[derive(Debug, Clone, Deserialize)]
pub struct FeaturedContentRequest {
    #[serde(default)]
    pub post_ids: Option<Value>,
}

impl FeaturedContentRequest {
    pub fn validate(&self) -> Option<String> {
        match &self.post_ids {
            Some(Value::Array(_)) => None,
            _ => Some("post_ids must be an array".to_string()),
        }
    }
}

/// Body of `PUT /api/media/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct MediaCategoriesRequest {
    #[serde(default)]
    pub attachment_category: Option<Value>,
}

impl MediaCategoriesRequest {
    pub fn validate(&self) -> Option<String> {
        match &self.attachment_category {
            Some(Value::Array(_)) => None,
            _ => Some("attachment_category must be an array".to_string()),
        }
    }
}

/// Query of `DELETE /api/products/:id/variations/:variation_id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub force: Option<String>,
}

impl DeleteQuery {
    /// Only the literal `true` forces a permanent delete.
    pub fn is_forced(&self) -> bool {
        self.force.as_deref() == Some("true")
    }
}

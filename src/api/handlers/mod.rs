//! API Handlers
//!
//! One module per resource family. Read handlers sit behind the response
//! cache middleware; mutation handlers call the upstream, then the
//! invalidator, then answer.

pub mod catalog;
pub mod content;
pub mod media;
pub mod settings;
pub mod system;

pub use catalog::*;
pub use content::*;
pub use media::*;
pub use settings::*;
pub use system::*;

use crate::error::{GatewayError, Result};

/// Query pairs forwarded verbatim to the upstream, in request order.
pub type ForwardedQuery = Vec<(String, String)>;

/// Upstream ids are numeric; anything else is rejected before any upstream
/// call.
pub(crate) fn parse_id(raw: &str, resource: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| GatewayError::InvalidRequest(format!("invalid {} id: {}", resource, raw)))
}

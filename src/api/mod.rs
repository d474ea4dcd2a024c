//! API Module
//!
//! HTTP handlers and routing for the gateway. Read routes are served through
//! the response cache; mutation routes go straight to the upstream and
//! invalidate what they made stale.

pub mod handlers;
pub mod routes;
mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use handlers::*;
pub use routes::create_router;
pub use state::AppState;

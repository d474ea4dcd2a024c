//! Background Tasks Module
//!
//! # Tasks
//! - Expiry sweep: removes expired cache entries that are never read again

mod cleanup;

pub use cleanup::spawn_cleanup_task;

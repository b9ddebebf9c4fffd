//! service-core: Shared infrastructure for the termacls workspace.
pub mod config;
pub mod error;
pub mod observability;

pub use serde;
pub use tracing;

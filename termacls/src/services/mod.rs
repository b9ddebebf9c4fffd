//! Services layer for termacls.
//!
//! Provides the storage seams of the decision layer and their Postgres and
//! in-memory implementations.

mod database;
pub mod error;
mod memory;
pub mod metrics;
mod store;

pub use database::{Database, DEPLOYMENT_TABLE, SYSTEM_TABLE};
pub use error::AclError;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use store::{AclStore, GrantStore, InventoryStore};

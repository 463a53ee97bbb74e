//! Durable storage of queries and response statuses.

mod sqlite_store;
mod store;

pub use sqlite_store::SqliteStatusStore;
pub use store::{CreateQueryRequest, StatusStore, StoreError};

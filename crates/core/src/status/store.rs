//! Status store trait and types.

use thiserror::Error;

use crate::detection::{ModelType, Query, QueryType, Response, ResponseRecord, ResponseStatus};

/// Error type for status store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No row exists for the given query id.
    #[error("Record not found for query {0}")]
    NotFound(i64),
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Request to create a new query row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateQueryRequest {
    pub query_type: QueryType,
    /// Stream URI or blob key. May be empty and filled in later with
    /// [`StatusStore::update_query_source`].
    pub source: String,
    pub model: ModelType,
}

/// Durable record of queries and the status of their responses.
///
/// Every write is per-row and last-write-wins; the store does not guard
/// status transitions.
pub trait StatusStore: Send + Sync {
    /// Insert a new query and return it with its assigned id.
    fn create_query(&self, request: CreateQueryRequest) -> Result<Query, StoreError>;

    /// Get a query by id.
    fn get_query(&self, id: i64) -> Result<Option<Query>, StoreError>;

    /// Replace the source of an existing query.
    fn update_query_source(&self, id: i64, source: &str) -> Result<(), StoreError>;

    /// Insert the response row for a query, in status `PROCESSING`.
    fn create_response(&self, query_id: i64) -> Result<Response, StoreError>;

    /// Overwrite the status of a response and touch its `updated_at`.
    fn update_response_status(
        &self,
        query_id: i64,
        status: ResponseStatus,
    ) -> Result<(), StoreError>;

    /// Get the full response row for a query.
    fn get_response(&self, query_id: i64) -> Result<Option<Response>, StoreError>;

    /// Look up the query type and response status for a query.
    ///
    /// Returns [`StoreError::NotFound`] if either row is missing.
    fn find_response_by_query_id(&self, query_id: i64) -> Result<ResponseRecord, StoreError>;
}

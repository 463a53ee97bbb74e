//! In-memory status store for testing.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::detection::{Query, Response, ResponseRecord, ResponseStatus};
use crate::status::{CreateQueryRequest, StatusStore, StoreError};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    CreateQuery,
    CreateResponse,
    UpdateResponseStatus,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    queries: HashMap<i64, Query>,
    responses: HashMap<i64, Response>,
    status_writes: Vec<(i64, ResponseStatus)>,
    failures: HashMap<StoreOperation, StoreError>,
}

/// Mock implementation of the StatusStore trait.
///
/// Records every status write in order and fails selected operations until
/// [`MockStatusStore::clear_failures`] is called.
#[derive(Debug, Default)]
pub struct MockStatusStore {
    state: Mutex<State>,
}

impl MockStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail every call to `operation` with `error`.
    pub fn fail(&self, operation: StoreOperation, error: StoreError) {
        self.state().failures.insert(operation, error);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Every successful `update_response_status` call, in order.
    pub fn status_writes(&self) -> Vec<(i64, ResponseStatus)> {
        self.state().status_writes.clone()
    }

    /// Status writes made for one job.
    pub fn status_writes_for(&self, query_id: i64) -> Vec<ResponseStatus> {
        self.state()
            .status_writes
            .iter()
            .filter(|(id, _)| *id == query_id)
            .map(|(_, status)| *status)
            .collect()
    }

    pub fn status_of(&self, query_id: i64) -> Option<ResponseStatus> {
        self.state().responses.get(&query_id).map(|r| r.status)
    }

    pub fn query_count(&self) -> usize {
        self.state().queries.len()
    }

    pub fn response_count(&self) -> usize {
        self.state().responses.len()
    }

    fn check(&self, state: &State, operation: StoreOperation) -> Result<(), StoreError> {
        match state.failures.get(&operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl StatusStore for MockStatusStore {
    fn create_query(&self, request: CreateQueryRequest) -> Result<Query, StoreError> {
        let mut state = self.state();
        self.check(&state, StoreOperation::CreateQuery)?;

        state.next_id += 1;
        let query = Query {
            id: state.next_id,
            query_type: request.query_type,
            source: request.source,
            model: request.model,
            created_at: Utc::now(),
        };
        state.queries.insert(query.id, query.clone());
        Ok(query)
    }

    fn get_query(&self, id: i64) -> Result<Option<Query>, StoreError> {
        Ok(self.state().queries.get(&id).cloned())
    }

    fn update_query_source(&self, id: i64, source: &str) -> Result<(), StoreError> {
        let mut state = self.state();
        let query = state.queries.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        query.source = source.to_string();
        Ok(())
    }

    fn create_response(&self, query_id: i64) -> Result<Response, StoreError> {
        let mut state = self.state();
        self.check(&state, StoreOperation::CreateResponse)?;

        if !state.queries.contains_key(&query_id) {
            return Err(StoreError::Database(format!(
                "no query {} for response",
                query_id
            )));
        }

        let now = Utc::now();
        let response = Response {
            query_id,
            status: ResponseStatus::Processing,
            created_at: now,
            updated_at: now,
        };
        state.responses.insert(query_id, response.clone());
        Ok(response)
    }

    fn update_response_status(
        &self,
        query_id: i64,
        status: ResponseStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        self.check(&state, StoreOperation::UpdateResponseStatus)?;

        let response = state
            .responses
            .get_mut(&query_id)
            .ok_or(StoreError::NotFound(query_id))?;
        response.status = status;
        response.updated_at = Utc::now();
        state.status_writes.push((query_id, status));
        Ok(())
    }

    fn get_response(&self, query_id: i64) -> Result<Option<Response>, StoreError> {
        Ok(self.state().responses.get(&query_id).cloned())
    }

    fn find_response_by_query_id(&self, query_id: i64) -> Result<ResponseRecord, StoreError> {
        let state = self.state();
        let response = state
            .responses
            .get(&query_id)
            .ok_or(StoreError::NotFound(query_id))?;
        let query = state
            .queries
            .get(&query_id)
            .ok_or(StoreError::NotFound(query_id))?;
        Ok(ResponseRecord {
            query_type: query.query_type,
            status: response.status,
        })
    }
}

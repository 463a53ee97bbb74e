//! Mock inference client for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::detection::Anomaly;
use crate::inference::{InferenceClient, InferenceError, ProcessReply};

/// How the mock answers a `process` call.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Reply immediately with this remote status string.
    Reply(String),
    /// Fail immediately with this error.
    Fail(InferenceError),
    /// Block until the job's token is cancelled, then return `Canceled`.
    WaitForCancel,
    /// Reply with the status after a delay, unless cancelled first.
    Delayed(Duration, String),
    /// Panic inside the call.
    Panic,
}

/// A recorded `process` call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedProcessCall {
    pub job_id: i64,
    pub source: String,
    /// When the call was made.
    pub timestamp: chrono::DateTime<Utc>,
}

/// Mock implementation of the InferenceClient trait.
///
/// Provides controllable behavior for testing:
/// - Per-job or default reply behavior
/// - Track process calls and observed cancellations
/// - Canned anomalies for result lookups
///
/// # Example
///
/// ```rust,ignore
/// let inference = MockInferenceClient::new();
/// inference.set_default_behavior(MockBehavior::WaitForCancel).await;
/// inference.set_behavior(42, MockBehavior::Reply("SUCCESS".into())).await;
///
/// // ... submit jobs ...
///
/// assert!(inference.wait_for_calls(1, Duration::from_secs(1)).await);
/// ```
#[derive(Debug, Clone)]
pub struct MockInferenceClient {
    default_behavior: Arc<RwLock<MockBehavior>>,
    behaviors: Arc<RwLock<HashMap<i64, MockBehavior>>>,
    calls: Arc<RwLock<Vec<RecordedProcessCall>>>,
    cancelled: Arc<RwLock<Vec<i64>>>,
    results: Arc<RwLock<HashMap<i64, Vec<Anomaly>>>>,
    result_error: Arc<RwLock<Option<InferenceError>>>,
    result_calls: Arc<RwLock<usize>>,
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInferenceClient {
    /// Create a mock that replies `SUCCESS` to every call.
    pub fn new() -> Self {
        Self::with_default_behavior(MockBehavior::Reply("SUCCESS".to_string()))
    }

    pub fn with_default_behavior(behavior: MockBehavior) -> Self {
        Self {
            default_behavior: Arc::new(RwLock::new(behavior)),
            behaviors: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            cancelled: Arc::new(RwLock::new(Vec::new())),
            results: Arc::new(RwLock::new(HashMap::new())),
            result_error: Arc::new(RwLock::new(None)),
            result_calls: Arc::new(RwLock::new(0)),
        }
    }

    pub async fn set_default_behavior(&self, behavior: MockBehavior) {
        *self.default_behavior.write().await = behavior;
    }

    /// Override the behavior for a single job.
    pub async fn set_behavior(&self, job_id: i64, behavior: MockBehavior) {
        self.behaviors.write().await.insert(job_id, behavior);
    }

    /// Anomalies returned by `find_result` for `job_id`.
    pub async fn set_result(&self, job_id: i64, anomalies: Vec<Anomaly>) {
        self.results.write().await.insert(job_id, anomalies);
    }

    /// Make every `find_result` call fail with `error`.
    pub async fn set_result_error(&self, error: InferenceError) {
        *self.result_error.write().await = Some(error);
    }

    /// Get all recorded process calls.
    pub async fn calls(&self) -> Vec<RecordedProcessCall> {
        self.calls.read().await.clone()
    }

    /// Jobs whose call returned because their token was cancelled.
    pub async fn cancelled_jobs(&self) -> Vec<i64> {
        self.cancelled.read().await.clone()
    }

    pub async fn result_calls(&self) -> usize {
        *self.result_calls.read().await
    }

    /// Wait until at least `count` process calls have been made.
    ///
    /// Returns false if `timeout` elapses first.
    pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.calls.read().await.len() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Wait until `job_id` has observed its cancellation.
    pub async fn wait_for_cancellation(&self, job_id: i64, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.cancelled.read().await.contains(&job_id) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn behavior_for(&self, job_id: i64) -> MockBehavior {
        match self.behaviors.read().await.get(&job_id) {
            Some(behavior) => behavior.clone(),
            None => self.default_behavior.read().await.clone(),
        }
    }

    async fn record_cancelled(&self, job_id: i64) -> Result<ProcessReply, InferenceError> {
        self.cancelled.write().await.push(job_id);
        Err(InferenceError::Canceled)
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn process(
        &self,
        cancel: &CancellationToken,
        job_id: i64,
        source: &str,
    ) -> Result<ProcessReply, InferenceError> {
        self.calls.write().await.push(RecordedProcessCall {
            job_id,
            source: source.to_string(),
            timestamp: Utc::now(),
        });

        match self.behavior_for(job_id).await {
            MockBehavior::Reply(status) => Ok(ProcessReply { status }),
            MockBehavior::Fail(error) => Err(error),
            MockBehavior::WaitForCancel => {
                cancel.cancelled().await;
                self.record_cancelled(job_id).await
            }
            MockBehavior::Delayed(delay, status) => {
                tokio::select! {
                    _ = cancel.cancelled() => self.record_cancelled(job_id).await,
                    _ = tokio::time::sleep(delay) => Ok(ProcessReply { status }),
                }
            }
            MockBehavior::Panic => panic!("mock inference panic for job {}", job_id),
        }
    }

    async fn find_result(&self, job_id: i64) -> Result<Vec<Anomaly>, InferenceError> {
        *self.result_calls.write().await += 1;

        if let Some(error) = self.result_error.read().await.clone() {
            return Err(error);
        }

        Ok(self
            .results
            .read()
            .await
            .get(&job_id)
            .cloned()
            .unwrap_or_default())
    }
}

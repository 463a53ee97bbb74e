//! JSON-over-HTTP inference client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::InferenceConfig;
use crate::detection::Anomaly;

use super::types::{
    InferenceClient, InferenceError, ProcessReply, ProcessRequest, ResultReply, ResultRequest,
};

/// Inference client speaking JSON to `POST {url}/process` and `POST {url}/result`.
///
/// Only a connect timeout is configured. A processing call may legitimately
/// run for as long as the stream does, so it is bounded solely by its
/// cancellation token.
pub struct HttpInferenceClient {
    client: Client,
    base_url: String,
}

impl HttpInferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| InferenceError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R, InferenceError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InferenceError::Remote {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| InferenceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn process(
        &self,
        cancel: &CancellationToken,
        job_id: i64,
        source: &str,
    ) -> Result<ProcessReply, InferenceError> {
        let request = ProcessRequest {
            id: job_id,
            source: source.to_string(),
        };

        // Dropping the request future closes the connection, which is how the
        // remote side learns about the cancellation.
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(job_id, "Inference call aborted by cancellation");
                Err(InferenceError::Canceled)
            }
            reply = self.post_json::<_, ProcessReply>("/process", &request) => reply,
        }
    }

    async fn find_result(&self, job_id: i64) -> Result<Vec<Anomaly>, InferenceError> {
        let reply: ResultReply = self
            .post_json("/result", &ResultRequest { id: job_id })
            .await?;
        Ok(reply.anomalies)
    }
}

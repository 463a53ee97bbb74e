use std::sync::Arc;
use vidscan_core::{Config, DetectionOrchestrator, ResultReader, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<DetectionOrchestrator>,
    results: ResultReader,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<DetectionOrchestrator>,
        results: ResultReader,
    ) -> Self {
        Self {
            config,
            orchestrator,
            results,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &DetectionOrchestrator {
        &self.orchestrator
    }

    pub fn results(&self) -> &ResultReader {
        &self.results
    }
}

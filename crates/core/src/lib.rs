pub mod blob;
pub mod config;
pub mod detection;
pub mod inference;
pub mod metrics;
pub mod orchestrator;
pub mod results;
pub mod status;
pub mod testing;

pub use blob::{BlobError, BlobReader, BlobStore, FsBlobStore, DEFAULT_VIDEO_BUCKET};
pub use config::{
    load_config, load_config_from_str, validate_config, BlobStoreConfig, Config, ConfigError,
    DatabaseConfig, InferenceConfig, SanitizedConfig, ServerConfig,
};
pub use detection::{
    Anomaly, DetectionResult, ModelType, ParseError, Query, QueryType, Response, ResponseRecord,
    ResponseStatus,
};
pub use inference::{HttpInferenceClient, InferenceClient, InferenceError, ProcessReply};
pub use orchestrator::{
    DetectionOrchestrator, JobRegistry, JobSource, OrchestratorError, OrchestratorStatus,
    SubmitRequest,
};
pub use results::ResultReader;
pub use status::{CreateQueryRequest, SqliteStatusStore, StatusStore, StoreError};

//! Detection domain types shared by every component.

mod types;

pub use types::{
    Anomaly, DetectionResult, ModelType, ParseError, Query, QueryType, Response, ResponseRecord,
    ResponseStatus, UnrecognizedRemoteStatus,
};

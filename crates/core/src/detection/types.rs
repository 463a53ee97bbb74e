//! Core types for detection queries and their responses.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing detection enums from strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unable to match query type: {0}")]
    WrongQueryType(String),

    #[error("unable to match model type: {0}")]
    WrongModelType(String),

    #[error("unable to match response status: {0}")]
    WrongResponseStatus(String),
}

/// Kind of media a query was submitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
    /// A live RTSP stream.
    Stream,
    /// An uploaded video file.
    Video,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Stream => "STREAM",
            QueryType::Video => "VIDEO",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stream" => Ok(QueryType::Stream),
            "video" => Ok(QueryType::Video),
            _ => Err(ParseError::WrongQueryType(s.to_string())),
        }
    }
}

/// Model selector forwarded with a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelType {
    Rgb,
    Bytes,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Rgb => "RGB",
            ModelType::Bytes => "BYTES",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(ModelType::Rgb),
            "bytes" => Ok(ModelType::Bytes),
            _ => Err(ParseError::WrongModelType(s.to_string())),
        }
    }
}

/// Status of a query's response row.
///
/// `Processing` is the only non-terminal status. A response leaves it exactly
/// once under normal operation, although a concurrent cancel and completion
/// may both write a terminal value (the later write wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Processing,
    Success,
    Error,
    Canceled,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Processing => "PROCESSING",
            ResponseStatus::Success => "SUCCESS",
            ResponseStatus::Error => "ERROR",
            ResponseStatus::Canceled => "CANCELED",
        }
    }

    /// Whether no further transition is expected from this status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResponseStatus::Processing)
    }

    /// Map a terminal status string reported by the inference service.
    ///
    /// Matching is case-insensitive. Anything outside the four known names is
    /// rejected so that callers never persist an invalid status.
    pub fn from_remote(raw: &str) -> Result<Self, UnrecognizedRemoteStatus> {
        raw.parse()
            .map_err(|_| UnrecognizedRemoteStatus(raw.to_string()))
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "processing" => Ok(ResponseStatus::Processing),
            "success" => Ok(ResponseStatus::Success),
            "error" => Ok(ResponseStatus::Error),
            "canceled" => Ok(ResponseStatus::Canceled),
            _ => Err(ParseError::WrongResponseStatus(s.to_string())),
        }
    }
}

/// The inference service reported a status outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized remote status: {0:?}")]
pub struct UnrecognizedRemoteStatus(pub String);

/// A persisted detection request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Assigned by the status store.
    pub id: i64,
    #[serde(rename = "type")]
    pub query_type: QueryType,
    /// Stream URI or blob key of the uploaded video.
    pub source: String,
    pub model: ModelType,
    pub created_at: DateTime<Utc>,
}

/// The response row paired one-to-one with a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub query_id: i64,
    pub status: ResponseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query type and current status joined for result reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseRecord {
    pub query_type: QueryType,
    pub status: ResponseStatus,
}

/// A single anomaly detected by the inference service.
///
/// For VIDEO queries `ts` is the offset in seconds from the start of the
/// video; for STREAM queries it is a unix timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub ts: i64,
    #[serde(rename = "link", default)]
    pub links: Vec<String>,
    #[serde(rename = "class")]
    pub class: String,
}

/// Current status and anomalies of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub status: ResponseStatus,
    pub anomalies: Vec<Anomaly>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_type_parse_case_insensitive() {
        assert_eq!("video".parse::<QueryType>().unwrap(), QueryType::Video);
        assert_eq!("STREAM".parse::<QueryType>().unwrap(), QueryType::Stream);
        assert!(matches!(
            "archive".parse::<QueryType>(),
            Err(ParseError::WrongQueryType(_))
        ));
    }

    #[test]
    fn test_model_type_parse() {
        assert_eq!("rgb".parse::<ModelType>().unwrap(), ModelType::Rgb);
        assert_eq!("Bytes".parse::<ModelType>().unwrap(), ModelType::Bytes);
        assert!(matches!(
            "yolo".parse::<ModelType>(),
            Err(ParseError::WrongModelType(_))
        ));
    }

    #[test]
    fn test_from_remote_known_statuses() {
        assert_eq!(
            ResponseStatus::from_remote("SUCCESS").unwrap(),
            ResponseStatus::Success
        );
        assert_eq!(
            ResponseStatus::from_remote("Error").unwrap(),
            ResponseStatus::Error
        );
        assert_eq!(
            ResponseStatus::from_remote("canceled").unwrap(),
            ResponseStatus::Canceled
        );
    }

    #[test]
    fn test_from_remote_unrecognized() {
        let err = ResponseStatus::from_remote("WEIRD").unwrap_err();
        assert_eq!(err, UnrecognizedRemoteStatus("WEIRD".to_string()));
        assert_eq!(err.to_string(), "unrecognized remote status: \"WEIRD\"");
        assert!(ResponseStatus::from_remote("").is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ResponseStatus::Processing.is_terminal());
        assert!(ResponseStatus::Success.is_terminal());
        assert!(ResponseStatus::Error.is_terminal());
        assert!(ResponseStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_anomaly_wire_shape() {
        let anomaly = Anomaly {
            ts: 12,
            links: vec!["detection-frame/42/12_0.jpg".to_string()],
            class: "BLUR".to_string(),
        };
        let json = serde_json::to_value(&anomaly).unwrap();
        assert_eq!(json["ts"], 12);
        assert_eq!(json["link"][0], "detection-frame/42/12_0.jpg");
        assert_eq!(json["class"], "BLUR");
    }

    #[test]
    fn test_detection_result_serialization() {
        let result = DetectionResult {
            query_type: QueryType::Video,
            status: ResponseStatus::Processing,
            anomalies: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "VIDEO");
        assert_eq!(json["status"], "PROCESSING");
        assert!(json["anomalies"].as_array().unwrap().is_empty());
    }
}

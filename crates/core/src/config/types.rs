use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::blob::DEFAULT_VIDEO_BUCKET;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub inference: InferenceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub blob_store: BlobStoreConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Maximum request body size in megabytes (bounds video uploads)
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            body_limit_mb: default_body_limit_mb(),
        }
    }
}

impl ServerConfig {
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit_mb() -> usize {
    1024
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("vidscan.db")
}

/// Blob store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlobStoreConfig {
    /// Directory holding one subdirectory per bucket
    #[serde(default = "default_blob_root")]
    pub root: PathBuf,
    #[serde(default = "default_video_bucket")]
    pub video_bucket: String,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            root: default_blob_root(),
            video_bucket: default_video_bucket(),
        }
    }
}

fn default_blob_root() -> PathBuf {
    PathBuf::from("blobs")
}

fn default_video_bucket() -> String {
    DEFAULT_VIDEO_BUCKET.to_string()
}

/// Inference service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    /// Base URL of the inference service (e.g., "http://ml:8000")
    pub url: String,
    /// Connect timeout in seconds (default: 10). Requests themselves have no timeout.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

/// Sanitized config for logging (credentials redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub blob_store: BlobStoreConfig,
    pub inference: SanitizedInferenceConfig,
}

/// Sanitized inference config (URL user info hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedInferenceConfig {
    pub url: String,
    pub connect_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            blob_store: config.blob_store.clone(),
            inference: SanitizedInferenceConfig {
                url: redact_user_info(&config.inference.url),
                connect_timeout_secs: config.inference.connect_timeout_secs,
            },
        }
    }
}

/// Replace `user:pass@` in a URL with `***@`.
///
/// Strings that do not parse as URLs, or carry no credentials, are returned
/// unchanged.
fn redact_user_info(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.username().is_empty() && parsed.password().is_none() {
        return url.to_string();
    }
    if parsed.set_password(None).is_err() || parsed.set_username("***").is_err() {
        return url.to_string();
    }
    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[inference]
url = "http://127.0.0.1:8000"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.inference.url, "http://127.0.0.1:8000");
        assert_eq!(config.inference.connect_timeout_secs, 10);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert!(config.server.cors_origins.is_empty());
        assert_eq!(config.database.path.to_str().unwrap(), "vidscan.db");
        assert_eq!(config.blob_store.video_bucket, "detection-video");
        assert_eq!(config.blob_store.root.to_str().unwrap(), "blobs");
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
cors_origins = ["http://localhost:3000"]
body_limit_mb = 64

[database]
path = "/data/vidscan.sqlite"

[blob_store]
root = "/data/blobs"
video_bucket = "videos"

[inference]
url = "http://ml:8000"
connect_timeout_secs = 3
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.server.body_limit_bytes(), 64 * 1024 * 1024);
        assert_eq!(config.database.path.to_str().unwrap(), "/data/vidscan.sqlite");
        assert_eq!(config.blob_store.video_bucket, "videos");
        assert_eq!(config.inference.connect_timeout_secs, 3);
    }

    #[test]
    fn test_deserialize_missing_inference_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config_hides_credentials() {
        let config: Config = toml::from_str(
            r#"
[inference]
url = "http://user:secret@ml:8000/v1"
"#,
        )
        .unwrap();

        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.inference.url, "http://***@ml:8000/v1");
        assert_eq!(sanitized.server.port, 8080);
    }

    #[test]
    fn test_redact_leaves_plain_urls() {
        assert_eq!(redact_user_info("http://ml:8000"), "http://ml:8000");
        assert_eq!(redact_user_info("not a url"), "not a url");
        assert_eq!(
            redact_user_info("http://ml:8000/path@x"),
            "http://ml:8000/path@x"
        );
        assert_eq!(
            redact_user_info("http://ml:8000?next=a@b"),
            "http://ml:8000?next=a@b"
        );
    }

    #[test]
    fn test_redact_stops_at_query_and_fragment() {
        assert_eq!(
            redact_user_info("http://user:pw@ml:8000?token=x@y"),
            "http://***@ml:8000/?token=x@y"
        );
        assert_eq!(
            redact_user_info("http://ml:8000#frag@x"),
            "http://ml:8000#frag@x"
        );
        assert_eq!(redact_user_info("http://onlyuser@ml/v1"), "http://***@ml/v1");
    }
}

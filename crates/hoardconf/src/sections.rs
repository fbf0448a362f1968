//! Configuration sections. Everything here is fixed once the server starts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest accepted upload, in bytes.
pub const DEFAULT_MAX_IMAGE_SIZE: u64 = 10_000_000;

/// Served ids never change content, so responses may be cached for a year.
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Filesystem paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the filesystem object store.
    /// Default: ~/.imghoard/store
    #[serde(default = "PathsConfig::default_store_dir")]
    pub store_dir: PathBuf,
}

impl PathsConfig {
    fn default_store_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".imghoard/store"))
            .unwrap_or_else(|| PathBuf::from(".imghoard/store"))
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            store_dir: Self::default_store_dir(),
        }
    }
}

/// Which object store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Sharded directories under `paths.store_dir`.
    #[default]
    File,
    /// In-process map; contents are lost on restart.
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::File => "file",
            StoreBackend::Memory => "memory",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Some(StoreBackend::File),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

/// Object store behaviour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Serve existing images but decline uploads.
    #[serde(default)]
    pub read_only: bool,
}

/// Network bind address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindConfig {
    /// Default: 0.0.0.0
    #[serde(default = "BindConfig::default_host")]
    pub host: String,

    /// Default: 8787
    #[serde(default = "BindConfig::default_http_port")]
    pub http_port: u16,
}

impl BindConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_http_port() -> u16 {
        8787
    }

    /// `host:port` suitable for a TCP listener.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            http_port: Self::default_http_port(),
        }
    }
}

/// Upload limits and response caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Default: 10,000,000 bytes
    #[serde(default = "ImagesConfig::default_max_image_size")]
    pub max_image_size: u64,

    /// `Cache-Control` value sent with every served image.
    /// Default: "public, max-age=31536000"
    #[serde(default = "ImagesConfig::default_cache_control")]
    pub cache_control: String,
}

impl ImagesConfig {
    fn default_max_image_size() -> u64 {
        DEFAULT_MAX_IMAGE_SIZE
    }

    fn default_cache_control() -> String {
        DEFAULT_CACHE_CONTROL.to_string()
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_image_size: Self::default_max_image_size(),
            cache_control: Self::default_cache_control(),
        }
    }
}

/// Logging and OpenTelemetry export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// OTLP gRPC endpoint. Export is disabled when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// `EnvFilter` directive.
    /// Default: info,imghoard=debug
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info,imghoard=debug".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            log_level: Self::default_log_level(),
        }
    }
}

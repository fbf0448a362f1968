//! Layered configuration loading for imghoard.
//!
//! # Usage
//!
//! ```rust,no_run
//! use hoardconf::HoardConfig;
//!
//! let config = HoardConfig::load().expect("Failed to load config");
//! println!("Store: {}", config.paths.store_dir.display());
//! println!("Listening on {}", config.bind.addr());
//! println!("Max upload: {} bytes", config.images.max_image_size);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/imghoard/config.toml` (system)
//! 2. `~/.config/imghoard/config.toml` (user)
//! 3. `./imghoard.toml` (local override, replaced by `--config` when given)
//! 4. Environment variables (`IMGHOARD_*`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! store_dir = "~/.imghoard/store"
//!
//! [store]
//! backend = "file"
//! read_only = false
//!
//! [bind]
//! host = "0.0.0.0"
//! http_port = 8787
//!
//! [images]
//! max_image_size = 10000000
//! cache_control = "public, max-age=31536000"
//!
//! [telemetry]
//! otlp_endpoint = "127.0.0.1:4317"
//! log_level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{
    BindConfig, ImagesConfig, PathsConfig, StoreBackend, StoreConfig, TelemetryConfig,
    DEFAULT_CACHE_CONTROL, DEFAULT_MAX_IMAGE_SIZE,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {var}: {message}")]
    Env { var: String, message: String },
}

/// Complete imghoard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoardConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub bind: BindConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl HoardConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration and report which files and variables contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = HoardConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_into(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources)?;

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand so an unset OTLP endpoint shows up as a comment
        let mut output = String::new();

        output.push_str("# imghoard configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!(
            "store_dir = \"{}\"\n",
            self.paths.store_dir.display()
        ));

        output.push_str("\n[store]\n");
        output.push_str(&format!("backend = \"{}\"\n", self.store.backend.as_str()));
        output.push_str(&format!("read_only = {}\n", self.store.read_only));

        output.push_str("\n[bind]\n");
        output.push_str(&format!("host = \"{}\"\n", self.bind.host));
        output.push_str(&format!("http_port = {}\n", self.bind.http_port));

        output.push_str("\n[images]\n");
        output.push_str(&format!(
            "max_image_size = {}\n",
            self.images.max_image_size
        ));
        output.push_str(&format!(
            "cache_control = \"{}\"\n",
            self.images.cache_control
        ));

        output.push_str("\n[telemetry]\n");
        match &self.telemetry.otlp_endpoint {
            Some(endpoint) => output.push_str(&format!("otlp_endpoint = \"{}\"\n", endpoint)),
            None => output.push_str("# otlp_endpoint = \"127.0.0.1:4317\"\n"),
        }
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HoardConfig::default();
        assert_eq!(config.bind.http_port, 8787);
        assert_eq!(config.images.max_image_size, 10_000_000);
        assert_eq!(config.images.cache_control, "public, max-age=31536000");
        assert_eq!(config.store.backend, StoreBackend::File);
        assert!(!config.store.read_only);
        assert!(config.telemetry.otlp_endpoint.is_none());
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = HoardConfig::default();
        config.paths.store_dir = PathBuf::from("/srv/imghoard");
        config.bind.http_port = 9000;
        config.telemetry.otlp_endpoint = Some("otel:4317".to_string());

        let rendered = config.to_toml();
        assert!(rendered.contains("[images]"));

        let restored: HoardConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_to_toml_comments_out_missing_endpoint() {
        let rendered = HoardConfig::default().to_toml();
        assert!(rendered.contains("# otlp_endpoint"));
    }
}

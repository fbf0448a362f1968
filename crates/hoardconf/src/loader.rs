//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, HoardConfig, StoreBackend};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli); only existing files.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/imghoard/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("imghoard/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("imghoard.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Overlay the values present in a TOML file onto `config`.
pub fn load_into(config: &mut HoardConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    overlay_toml(config, &contents, path)
}

/// Overlay a TOML document onto `config`. Keys absent from the document keep
/// their current values, so files layer field by field.
fn overlay_toml(config: &mut HoardConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| parse_err(e.to_string()))?;

    if let Some(paths) = table.get("paths").and_then(|v| v.as_table()) {
        if let Some(v) = paths.get("store_dir").and_then(|v| v.as_str()) {
            config.paths.store_dir = expand_path(v);
        }
    }

    if let Some(store) = table.get("store").and_then(|v| v.as_table()) {
        if let Some(v) = store.get("backend").and_then(|v| v.as_str()) {
            config.store.backend = StoreBackend::parse(v)
                .ok_or_else(|| parse_err(format!("unknown store backend '{}'", v)))?;
        }
        if let Some(v) = store.get("read_only").and_then(|v| v.as_bool()) {
            config.store.read_only = v;
        }
    }

    if let Some(bind) = table.get("bind").and_then(|v| v.as_table()) {
        if let Some(v) = bind.get("host").and_then(|v| v.as_str()) {
            config.bind.host = v.to_string();
        }
        if let Some(v) = bind.get("http_port").and_then(|v| v.as_integer()) {
            config.bind.http_port = u16::try_from(v)
                .map_err(|_| parse_err(format!("http_port out of range: {}", v)))?;
        }
    }

    if let Some(images) = table.get("images").and_then(|v| v.as_table()) {
        if let Some(v) = images.get("max_image_size").and_then(|v| v.as_integer()) {
            config.images.max_image_size = u64::try_from(v)
                .map_err(|_| parse_err(format!("max_image_size must be positive: {}", v)))?;
        }
        if let Some(v) = images.get("cache_control").and_then(|v| v.as_str()) {
            config.images.cache_control = v.to_string();
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("otlp_endpoint").and_then(|v| v.as_str()) {
            config.telemetry.otlp_endpoint = Some(v.to_string());
        }
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.telemetry.log_level = v.to_string();
        }
    }

    Ok(())
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(
    config: &mut HoardConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_overrides_from(config, sources, |key| env::var(key).ok())
}

/// Apply overrides from an arbitrary variable lookup.
///
/// A value that would be rejected in a config file is rejected here too.
pub fn apply_overrides_from<F>(
    config: &mut HoardConfig,
    sources: &mut ConfigSources,
    lookup: F,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut note = |key: &str| sources.env_overrides.push(key.to_string());

    if let Some(v) = lookup("IMGHOARD_STORE_DIR") {
        config.paths.store_dir = expand_path(&v);
        note("IMGHOARD_STORE_DIR");
    }
    if let Some(v) = lookup("IMGHOARD_STORE_BACKEND") {
        config.store.backend = StoreBackend::parse(&v).ok_or_else(|| {
            env_err("IMGHOARD_STORE_BACKEND", format!("unknown backend {:?}", v))
        })?;
        note("IMGHOARD_STORE_BACKEND");
    }
    if let Some(v) = lookup("IMGHOARD_READ_ONLY") {
        config.store.read_only = parse_bool(&v)
            .ok_or_else(|| env_err("IMGHOARD_READ_ONLY", format!("expected a boolean, got {:?}", v)))?;
        note("IMGHOARD_READ_ONLY");
    }

    if let Some(v) = lookup("IMGHOARD_HTTP_HOST") {
        config.bind.host = v;
        note("IMGHOARD_HTTP_HOST");
    }
    if let Some(v) = lookup("IMGHOARD_HTTP_PORT") {
        config.bind.http_port = v
            .parse()
            .map_err(|e| env_err("IMGHOARD_HTTP_PORT", format!("{:?}: {}", v, e)))?;
        note("IMGHOARD_HTTP_PORT");
    }

    if let Some(v) = lookup("IMGHOARD_MAX_IMAGE_SIZE") {
        config.images.max_image_size = v
            .parse()
            .map_err(|e| env_err("IMGHOARD_MAX_IMAGE_SIZE", format!("{:?}: {}", v, e)))?;
        note("IMGHOARD_MAX_IMAGE_SIZE");
    }
    if let Some(v) = lookup("IMGHOARD_CACHE_CONTROL") {
        config.images.cache_control = v;
        note("IMGHOARD_CACHE_CONTROL");
    }

    if let Some(v) = lookup("IMGHOARD_OTLP_ENDPOINT") {
        config.telemetry.otlp_endpoint = Some(v);
        note("IMGHOARD_OTLP_ENDPOINT");
    }
    // Also support standard OTEL env var
    if let Some(v) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.telemetry.otlp_endpoint = Some(v);
        note("OTEL_EXPORTER_OTLP_ENDPOINT");
    }
    if let Some(v) = lookup("IMGHOARD_LOG_LEVEL") {
        config.telemetry.log_level = v;
        note("IMGHOARD_LOG_LEVEL");
    }
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        note("RUST_LOG");
    }

    Ok(())
}

fn env_err(var: &str, message: String) -> ConfigError {
    ConfigError::Env {
        var: var.to_string(),
        message,
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Expand `~/` and a leading `$VAR` in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        let (var_name, rest) = match stripped.find('/') {
            Some(pos) => (&stripped[..pos], Some(&stripped[pos + 1..])),
            None => (stripped, None),
        };
        if let Ok(value) = env::var(var_name) {
            let base = PathBuf::from(value);
            return match rest {
                Some(rest) => base.join(rest),
                None => base,
            };
        }
    }

    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/images/store");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("images/store"));
    }

    #[test]
    fn test_expand_path_absolute() {
        assert_eq!(expand_path("/srv/images"), PathBuf::from("/srv/images"));
    }

    #[test]
    fn test_expand_path_unknown_var_is_literal() {
        let expanded = expand_path("$IMGHOARD_SURELY_UNSET_VAR/store");
        assert_eq!(expanded, PathBuf::from("$IMGHOARD_SURELY_UNSET_VAR/store"));
    }

    #[test]
    fn test_overlay_minimal_toml() {
        let mut config = HoardConfig::default();
        let toml = r#"
[bind]
http_port = 9000
"#;
        overlay_toml(&mut config, toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.bind.http_port, 9000);
        // Other values should be defaults
        assert_eq!(config.bind.host, "0.0.0.0");
        assert_eq!(config.images.max_image_size, 10_000_000);
    }

    #[test]
    fn test_overlay_full_toml() {
        let mut config = HoardConfig::default();
        let toml = r#"
[paths]
store_dir = "/data/images"

[store]
backend = "memory"
read_only = true

[bind]
host = "127.0.0.1"
http_port = 8080

[images]
max_image_size = 2048
cache_control = "public, max-age=60"

[telemetry]
otlp_endpoint = "collector:4317"
log_level = "debug"
"#;
        overlay_toml(&mut config, toml, Path::new("test.toml")).unwrap();

        assert_eq!(config.paths.store_dir, PathBuf::from("/data/images"));
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(config.store.read_only);
        assert_eq!(config.bind.addr(), "127.0.0.1:8080");
        assert_eq!(config.images.max_image_size, 2048);
        assert_eq!(config.images.cache_control, "public, max-age=60");
        assert_eq!(config.telemetry.otlp_endpoint.as_deref(), Some("collector:4317"));
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_later_files_layer_over_earlier() {
        let mut config = HoardConfig::default();
        overlay_toml(
            &mut config,
            "[bind]\nhttp_port = 9000\n[images]\nmax_image_size = 100\n",
            Path::new("system.toml"),
        )
        .unwrap();
        overlay_toml(&mut config, "[bind]\nhttp_port = 9100\n", Path::new("local.toml")).unwrap();

        assert_eq!(config.bind.http_port, 9100);
        assert_eq!(config.images.max_image_size, 100);
    }

    #[test]
    fn test_overlay_rejects_bad_values() {
        let mut config = HoardConfig::default();
        assert!(overlay_toml(&mut config, "[bind]\nhttp_port = 70000\n", Path::new("a.toml")).is_err());
        assert!(overlay_toml(&mut config, "[store]\nbackend = \"s3\"\n", Path::new("b.toml")).is_err());
        assert!(overlay_toml(&mut config, "not = [valid", Path::new("c.toml")).is_err());
    }

    #[test]
    fn test_load_into_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("imghoard.toml");
        std::fs::write(&path, "[images]\ncache_control = \"no-store\"\n").unwrap();

        let mut config = HoardConfig::default();
        load_into(&mut config, &path).unwrap();
        assert_eq!(config.images.cache_control, "no-store");

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            load_into(&mut config, &missing),
            Err(ConfigError::FileRead { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("IMGHOARD_STORE_DIR", "/env/store"),
            ("IMGHOARD_READ_ONLY", "1"),
            ("IMGHOARD_HTTP_PORT", "7000"),
            ("IMGHOARD_MAX_IMAGE_SIZE", "512"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "otel:4317"),
            ("RUST_LOG", "warn"),
        ]);
        let mut config = HoardConfig::default();
        let mut sources = ConfigSources::default();

        apply_overrides_from(&mut config, &mut sources, |k| {
            vars.get(k).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.paths.store_dir, PathBuf::from("/env/store"));
        assert!(config.store.read_only);
        assert_eq!(config.bind.http_port, 7000);
        assert_eq!(config.images.max_image_size, 512);
        assert_eq!(config.telemetry.otlp_endpoint.as_deref(), Some("otel:4317"));
        assert_eq!(config.telemetry.log_level, "warn");
        assert_eq!(sources.env_overrides.len(), 6);
    }

    #[test]
    fn test_env_rejects_values_a_file_would_reject() {
        for (var, value) in [
            ("IMGHOARD_STORE_BACKEND", "s3"),
            ("IMGHOARD_HTTP_PORT", "not-a-port"),
            ("IMGHOARD_HTTP_PORT", "70000"),
            ("IMGHOARD_MAX_IMAGE_SIZE", "-1"),
            ("IMGHOARD_READ_ONLY", "maybe"),
        ] {
            let mut config = HoardConfig::default();
            let mut sources = ConfigSources::default();

            let result = apply_overrides_from(&mut config, &mut sources, |k| {
                (k == var).then(|| value.to_string())
            });

            match result {
                Err(ConfigError::Env { var: reported, .. }) => assert_eq!(reported, var),
                other => panic!("{}={} should be rejected, got {:?}", var, value, other),
            }
            assert_eq!(config, HoardConfig::default());
            assert!(sources.env_overrides.is_empty());
        }
    }

    #[test]
    fn test_env_backend_and_read_only_spellings() {
        let mut config = HoardConfig::default();
        let mut sources = ConfigSources::default();

        apply_overrides_from(&mut config, &mut sources, |k| match k {
            "IMGHOARD_STORE_BACKEND" => Some("Memory".to_string()),
            "IMGHOARD_READ_ONLY" => Some("FALSE".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(!config.store.read_only);
    }
}

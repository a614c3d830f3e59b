//! Estate dashboard configuration
//!
//! Resolution order, later layers win:
//!
//! 1. built-in defaults
//! 2. YAML file (`--config`, or `<config_dir>/estate/config.yaml` when present)
//! 3. `ESTATE_*` environment variables
//!
//! Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Idle sessions older than this are pruned
    pub session_ttl_minutes: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5173,
            session_ttl_minutes: 60,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.session_ttl_minutes) * 60)
    }
}

/// Prediction backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix
    pub base_url: String,
    /// Bound on metadata and lookup requests
    pub request_timeout_ms: u64,
    pub predict_timeout_ms: u64,
    /// Minimum time the busy indicator stays up after a submit
    pub min_busy_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            request_timeout_ms: 15_000,
            predict_timeout_ms: 10_000,
            min_busy_ms: 1_000,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn predict_timeout(&self) -> Duration {
        Duration::from_millis(self.predict_timeout_ms)
    }

    pub fn min_busy(&self) -> Duration {
        Duration::from_millis(self.min_busy_ms)
    }
}

/// Static asset locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory holding the generated chart images
    pub charts_dir: PathBuf,
    /// URL prefix the charts are served under
    pub charts_url: String,
    /// Directory holding `<view>.html` fragments
    pub partials_dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            charts_dir: PathBuf::from("charts"),
            charts_url: "/charts".to_string(),
            partials_dir: PathBuf::from("partials"),
        }
    }
}

/// Layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Viewport width below which the sidebar uses the mobile layout
    pub mobile_breakpoint: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 800,
        }
    }
}

/// Complete dashboard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub assets: AssetsConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("estate").join("config.yaml"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Apply `ESTATE_*` overrides from a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ESTATE_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("ESTATE_PORT") {
            self.server.port = parse_value("ESTATE_PORT", &v)?;
        }
        if let Some(v) = lookup("ESTATE_SESSION_TTL_MINUTES") {
            self.server.session_ttl_minutes = parse_value("ESTATE_SESSION_TTL_MINUTES", &v)?;
        }
        if let Some(v) = lookup("ESTATE_API_BASE") {
            self.api.base_url = v;
        }
        if let Some(v) = lookup("ESTATE_REQUEST_TIMEOUT_MS") {
            self.api.request_timeout_ms = parse_value("ESTATE_REQUEST_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("ESTATE_PREDICT_TIMEOUT_MS") {
            self.api.predict_timeout_ms = parse_value("ESTATE_PREDICT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("ESTATE_CHARTS_DIR") {
            self.assets.charts_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ESTATE_PARTIALS_DIR") {
            self.assets.partials_dir = PathBuf::from(v);
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr(), "127.0.0.1:5173");
        assert_eq!(config.api.predict_timeout(), Duration::from_secs(10));
        assert_eq!(config.api.min_busy(), Duration::from_secs(1));
        assert_eq!(config.api.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.server.session_ttl(), Duration::from_secs(3600));
        assert_eq!(config.ui.mobile_breakpoint, 800);
        assert_eq!(config.assets.charts_url, "/charts");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "api:\n  base_url: http://backend:9000/api\nui:\n  mobile_breakpoint: 640\n",
        )
        .unwrap();
        assert_eq!(config.api.base_url, "http://backend:9000/api");
        assert_eq!(config.api.predict_timeout_ms, 10_000);
        assert_eq!(config.ui.mobile_breakpoint, 640);
        assert_eq!(config.server.port, 5173);
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ESTATE_PORT", "8080"),
            ("ESTATE_API_BASE", "http://10.0.0.2:8000/api"),
            ("ESTATE_CHARTS_DIR", "/srv/charts"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.api.base_url, "http://10.0.0.2:8000/api");
        assert_eq!(config.assets.charts_dir, PathBuf::from("/srv/charts"));
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_env_invalid_port() {
        let mut config = Config::default();
        let err = config
            .apply_env(|k| (k == "ESTATE_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_negative_session_ttl_rejected() {
        assert!(Config::from_yaml("server:\n  session_ttl_minutes: -5\n").is_err());

        let mut config = Config::default();
        let err = config
            .apply_env(|k| (k == "ESTATE_SESSION_TTL_MINUTES").then(|| "-5".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_large_session_ttl() {
        let config = Config::from_yaml("server:\n  session_ttl_minutes: 4294967295\n").unwrap();
        assert_eq!(config.server.session_ttl(), Duration::from_secs(4_294_967_295 * 60));
    }

    #[test]
    fn test_request_timeout_env() {
        let mut config = Config::default();
        config
            .apply_env(|k| (k == "ESTATE_REQUEST_TIMEOUT_MS").then(|| "2500".to_string()))
            .unwrap();
        assert_eq!(config.api.request_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_missing_explicit_file() {
        let path = std::env::temp_dir().join("estate_config_does_not_exist.yaml");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("estate_config_{}.yaml", std::process::id()));
        std::fs::write(&path, "server:\n  port: 9999\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9999);
        std::fs::remove_file(&path).ok();
    }
}

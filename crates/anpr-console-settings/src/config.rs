//! Configuration for the ANPR console.
//!
//! Supports JSON and TOML files stored in the platform config directory.
//! Sections:
//! - API endpoints and timeouts
//! - Live stream path and polling fallback
//! - Designer canvas size

use std::path::{Path, PathBuf};
use std::time::Duration;

use anpr_console_core::constants::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Directory name under the platform config dir.
pub const APP_DIR: &str = "anpr-console";

/// Default config file name.
pub const CONFIG_FILE: &str = "config.toml";

/// Backend API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the backend API
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Zone configuration endpoint, relative to `base_url`
    pub zones_path: String,
    /// Event search endpoint, relative to `base_url`
    pub search_path: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 10_000,
            zones_path: "/config/zones".to_string(),
            search_path: "/events/search".to_string(),
        }
    }
}

/// Live feed settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Push channel endpoint, relative to the API base URL
    pub path: String,
    /// Polling fallback interval in milliseconds
    pub poll_interval_ms: u64,
    /// Page size used by polling and refresh
    pub search_limit: u32,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            path: "/events/stream".to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Designer canvas settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerSettings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub device_pixel_ratio: f32,
}

impl Default for DesignerSettings {
    fn default() -> Self {
        Self {
            canvas_width: 960,
            canvas_height: 520,
            device_pixel_ratio: 1.0,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiSettings,
    pub stream: StreamSettings,
    pub designer: DesignerSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML). Missing keys take defaults.
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML), creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Loads `path` if it exists, otherwise returns defaults.
    ///
    /// A file that exists but fails to parse or validate is an error.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let base = self.api.base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "api.base_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "api.base_url".to_string(),
                reason: "must use http or https".to_string(),
            });
        }

        if self.api.request_timeout_ms == 0 {
            return Err(ConfigError::out_of_range(
                "api.request_timeout_ms",
                self.api.request_timeout_ms,
            ));
        }

        if self.stream.poll_interval_ms == 0 {
            return Err(ConfigError::out_of_range(
                "stream.poll_interval_ms",
                self.stream.poll_interval_ms,
            ));
        }

        if !(1..=MAX_SEARCH_LIMIT).contains(&self.stream.search_limit) {
            return Err(ConfigError::out_of_range(
                "stream.search_limit",
                self.stream.search_limit,
            ));
        }

        if self.designer.canvas_width == 0 || self.designer.canvas_height == 0 {
            return Err(ConfigError::out_of_range(
                "designer.canvas_size",
                format!(
                    "{}x{}",
                    self.designer.canvas_width, self.designer.canvas_height
                ),
            ));
        }

        let dpr = self.designer.device_pixel_ratio;
        if !dpr.is_finite() || dpr <= 0.0 {
            return Err(ConfigError::out_of_range(
                "designer.device_pixel_ratio",
                dpr,
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.request_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.stream.poll_interval_ms)
    }
}

/// Platform config path, e.g. `~/.config/anpr-console/config.toml`.
pub fn default_config_path() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("no platform config directory".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stream.poll_interval_ms, 10_000);
        assert_eq!(config.stream.search_limit, 50);
        assert_eq!(config.designer.canvas_width, 960);
        assert_eq!(config.designer.canvas_height, 520);
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.stream.search_limit = 501;
        assert_eq!(
            config.validate(),
            Err(ConfigError::out_of_range("stream.search_limit", 501))
        );

        let mut config = Config::default();
        config.api.base_url = "ftp://host".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut config = Config::default();
        config.designer.device_pixel_ratio = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.stream.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[api]\nbase_url = \"https://anpr.local/api\"\n").unwrap();
        assert_eq!(config.api.base_url, "https://anpr.local/api");
        assert_eq!(config.api.zones_path, "/config/zones");
        assert_eq!(config.stream, StreamSettings::default());
    }

    #[test]
    fn test_format_of() {
        assert_eq!(format_of(Path::new("a.json")), Ok(Format::Json));
        assert_eq!(format_of(Path::new("a.toml")), Ok(Format::Toml));
        assert!(format_of(Path::new("a.yaml")).is_err());
    }
}

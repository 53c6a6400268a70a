//! ANPR Console Settings Crate
//!
//! Handles the console's configuration file: defaults, validation and
//! JSON/TOML persistence in the platform config directory.

pub mod config;
pub mod error;

pub use config::{
    default_config_path, ApiSettings, Config, DesignerSettings, StreamSettings, APP_DIR,
    CONFIG_FILE,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

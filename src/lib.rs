//! # ANPR Console
//!
//! Operations console core for an automatic-number-plate-recognition platform.
//!
//! ## Architecture
//!
//! The console is organized as a workspace with multiple crates:
//!
//! 1. **anpr-console-core** - Errors, constants, notification event bus
//! 2. **anpr-console-designer** - Polygon zone designer: geometry, viewport, renderer
//! 3. **anpr-console-stream** - Live plate feed with polling fallback
//! 4. **anpr-console-client** - HTTP client for zones and event search
//! 5. **anpr-console-settings** - Configuration file handling
//! 6. **anpr-console** - This crate: logging and the command line host

pub mod app;

pub use anpr_console_client::{ApiClient, ApiPaths};
pub use anpr_console_core::{ApiError, ConnectionError, Error, PolygonError, Result};
pub use anpr_console_designer::{
    CanvasRenderer, DesignerSession, Geometry, Point, SavePayload, Zone, ZoneDesigner, ZoneType,
};
pub use anpr_console_settings::Config;
pub use anpr_console_stream::{EventStreamReconciler, PlateEvent, SearchQuery, StreamFilter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log output style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    init_logging_with(LogFormat::Pretty)
}

/// Initialize logging in the given format.
pub fn init_logging_with(format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_level(true)
                .with_thread_names(true)
                .with_line_number(true)
                .pretty();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .json();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}

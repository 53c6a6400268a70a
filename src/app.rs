//! Builds the console's services from a [`Config`].

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use anpr_console_client::{ApiClient, ApiPaths};
use anpr_console_designer::{Background, CanvasRenderer};
use anpr_console_settings::{default_config_path, Config};
use anpr_console_stream::{EventStreamReconciler, ReconcilerConfig, WebSocketConnector};

/// Loads the config at `path`, or the platform default location.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            let path = default_config_path()?;
            Config::load_or_default(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
    }
}

pub fn api_client(config: &Config) -> anyhow::Result<ApiClient> {
    let paths = ApiPaths {
        zones: config.api.zones_path.clone(),
        search: config.api.search_path.clone(),
    };
    ApiClient::with_options(&config.api.base_url, paths, config.request_timeout())
        .with_context(|| format!("Invalid API base URL '{}'", config.api.base_url))
}

/// Reconciler over the WebSocket feed, polling through `client`.
pub fn reconciler(config: &Config, client: ApiClient) -> EventStreamReconciler {
    let connector = WebSocketConnector::new(config.api.base_url.clone(), config.stream.path.clone());
    let reconciler_config = ReconcilerConfig {
        poll_interval: config.poll_interval(),
        search_limit: config.stream.search_limit,
        ..ReconcilerConfig::default()
    };
    EventStreamReconciler::new(Arc::new(connector), Arc::new(client), reconciler_config)
}

/// Canvas renderer sized from the designer settings.
pub fn renderer(config: &Config) -> CanvasRenderer {
    CanvasRenderer::new(config.designer.canvas_width, config.designer.canvas_height)
        .with_device_pixel_ratio(config.designer.device_pixel_ratio)
}

/// Loads a background image from a file path or an http(s) URL.
pub async fn load_background(source: &str) -> anyhow::Result<Background> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let bytes = reqwest::get(source)
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("Failed to fetch background {}", source))?
            .bytes()
            .await
            .with_context(|| format!("Failed to read background {}", source))?;
        Background::from_bytes(&bytes).context("Background is not a supported image")
    } else {
        Background::from_path(source)
            .with_context(|| format!("Failed to load background {}", source))
    }
}

/// Geometry given either inline or as a path to a file holding it.
pub fn read_geometry_arg(arg: &str) -> anyhow::Result<String> {
    let path = Path::new(arg);
    if !arg.trim_start().starts_with('{') && path.is_file() {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read geometry from {}", path.display()))
    } else {
        Ok(arg.to_string())
    }
}

mod cli;
mod commands;

use anpr_console::{app, init_logging_with, LogFormat};
use anpr_console_core::{event_bus, EventFilter};
use cli::{Args, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse_args();

    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_logging_with(format)?;

    let mut config = app::load_config(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
        config.validate()?;
    }
    tracing::debug!(
        "anpr-console {} (built {}) against {}",
        anpr_console::VERSION,
        anpr_console::BUILD_DATE,
        config.api.base_url
    );

    event_bus().subscribe(EventFilter::All, |event| {
        tracing::debug!("{}", event.description());
    });

    match args.command {
        Command::Watch(watch) => commands::watch(&config, watch).await,
        Command::Zones(zones) => commands::zones(&config, zones).await,
        Command::Validate { geometry } => commands::validate(&geometry),
        Command::Render(render) => commands::render(&config, render).await,
    }
}

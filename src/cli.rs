use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use anpr_console_designer::ZoneType;
use anpr_console_stream::StreamFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Config file (.toml or .json); defaults to the platform config dir
    #[arg(long, global = true, env = "ANPR_CONSOLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Overrides api.base_url from the config file
    #[arg(long, global = true, env = "ANPR_CONSOLE_API_URL")]
    pub base_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Follow the live plate feed, falling back to polling when the socket drops
    Watch(WatchArgs),

    /// Manage stored zones
    #[command(subcommand)]
    Zones(ZonesCommand),

    /// Check a geometry document and print its summary
    Validate {
        /// Geometry JSON, inline or as a file path
        geometry: String,
    },

    /// Draw a zone onto a PNG
    Render(RenderArgs),
}

#[derive(ClapArgs, Debug, Default)]
pub struct WatchArgs {
    /// Plate substring filter
    #[arg(long)]
    pub plate: Option<String>,

    #[arg(long)]
    pub camera: Option<i64>,

    #[arg(long)]
    pub zone: Option<i64>,

    /// Minimum detection confidence (0.0 - 1.0)
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<u64>,
}

impl WatchArgs {
    pub fn filter(&self) -> StreamFilter {
        let mut filter = StreamFilter::new();
        if let Some(plate) = &self.plate {
            filter = filter.with_plate(plate.clone());
        }
        if let Some(camera) = self.camera {
            filter = filter.with_camera(camera);
        }
        if let Some(zone) = self.zone {
            filter = filter.with_zone(zone);
        }
        if let Some(confidence) = self.min_confidence {
            filter = filter.with_min_confidence(confidence);
        }
        filter
    }
}

#[derive(Subcommand, Debug)]
pub enum ZonesCommand {
    /// List zones
    List {
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete a zone by id
    Delete { id: i64 },

    /// Create or update a zone from a geometry document
    Save {
        #[arg(long)]
        name: String,

        #[arg(long = "type", default_value = "Entry")]
        zone_type: ZoneType,

        /// Update this zone instead of creating a new one
        #[arg(long)]
        id: Option<i64>,

        /// Geometry JSON, inline or as a file path
        geometry: String,
    },
}

#[derive(ClapArgs, Debug)]
pub struct RenderArgs {
    /// Geometry JSON, inline or as a file path
    pub geometry: String,

    /// Output PNG path
    #[arg(long, short)]
    pub out: PathBuf,

    /// Background image path or http(s) URL
    #[arg(long)]
    pub background: Option<String>,

    #[arg(long, default_value = "")]
    pub name: String,

    #[arg(long = "type", default_value = "Entry")]
    pub zone_type: ZoneType,

    /// Overrides designer.canvas_width
    #[arg(long)]
    pub width: Option<u32>,

    /// Overrides designer.canvas_height
    #[arg(long)]
    pub height: Option<u32>,

    /// Overrides designer.device_pixel_ratio
    #[arg(long)]
    pub dpr: Option<f32>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

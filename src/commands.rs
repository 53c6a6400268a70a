use std::collections::HashSet;
use std::time::Duration;

use anyhow::{bail, Context};

use anpr_console::app;
use anpr_console::{Config, PlateEvent};
use anpr_console_core::{emit, AppEvent, ZoneEvent};
use anpr_console_designer::{geometry, zone_hex, InitialGeometry, ZoneDesigner};
use anpr_console_stream::SearchQuery;

use crate::cli::{RenderArgs, WatchArgs, ZonesCommand};

fn event_key(event: &PlateEvent) -> String {
    match event.id {
        Some(id) => id.to_string(),
        None => format!(
            "{}@{}",
            event.plate,
            event.timestamp.as_deref().unwrap_or_default()
        ),
    }
}

fn print_event(event: &PlateEvent) {
    let camera = event
        .camera_name
        .clone()
        .or_else(|| event.camera_id.map(|id| format!("camera {}", id)))
        .unwrap_or_else(|| "-".to_string());
    let zone = event
        .zone_name
        .clone()
        .or_else(|| event.zone_id.map(|id| format!("zone {}", id)))
        .unwrap_or_else(|| "-".to_string());
    let confidence = event
        .confidence
        .map(|c| format!("{:.0}%", c * 100.0))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:<20} {:<12} {:<16} {:<16} {:>5}",
        event.timestamp.as_deref().unwrap_or("-"),
        event.plate,
        camera,
        zone,
        confidence
    );
}

pub async fn watch(config: &Config, args: WatchArgs) -> anyhow::Result<()> {
    let client = app::api_client(config)?;
    let mut reconciler = app::reconciler(config, client);
    let filter = args.filter();

    let query = SearchQuery::from_filter(filter.clone()).with_limit(config.stream.search_limit);
    match reconciler.refresh(&query).await {
        Ok(count) => tracing::info!("Loaded {} recent events", count),
        Err(e) => tracing::warn!("Initial fetch failed: {}", e),
    }

    if let Err(e) = reconciler.connect(filter).await {
        tracing::warn!("Live feed unavailable, polling instead: {}", e);
    }

    let mut seen = HashSet::new();
    for event in reconciler.events().iter().rev() {
        seen.insert(event_key(event));
        print_event(event);
    }

    let mut revision = reconciler.subscribe_revision();
    let mut status = reconciler.subscribe_status();
    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            _ = &mut deadline => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                tracing::info!("Stream status: {}", current);
            }
            changed = revision.changed() => {
                if changed.is_err() {
                    break;
                }
                revision.borrow_and_update();
                for event in reconciler.events().iter().rev() {
                    if seen.insert(event_key(event)) {
                        print_event(event);
                    }
                }
            }
        }
    }

    reconciler.teardown();
    Ok(())
}

pub async fn zones(config: &Config, command: ZonesCommand) -> anyhow::Result<()> {
    let client = app::api_client(config)?;

    match command {
        ZonesCommand::List { json } => {
            let zones = client.list_zones().await.context("Failed to list zones")?;
            if json {
                let rows: Vec<_> = zones
                    .iter()
                    .map(|zone| {
                        serde_json::json!({
                            "id": zone.id,
                            "name": zone.name,
                            "type": zone.zone_type,
                            "color": zone_hex(zone.zone_type),
                            "points": zone.geometry.points.len(),
                            "geometry": geometry::serialize(&zone.geometry),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{:>5}  {:<24} {:<8} {:<8} {:>6}", "ID", "NAME", "TYPE", "COLOR", "POINTS");
                for zone in &zones {
                    println!(
                        "{:>5}  {:<24} {:<8} {:<8} {:>6}",
                        zone.id.map(|id| id.to_string()).unwrap_or_default(),
                        zone.name,
                        zone.zone_type,
                        zone_hex(zone.zone_type),
                        geometry::point_count(Some(&zone.geometry))
                    );
                }
            }
        }
        ZonesCommand::Delete { id } => {
            if let Err(e) = client.delete_zone(id).await {
                emit!(AppEvent::Zone(ZoneEvent::RequestFailed {
                    error: e.to_string()
                }));
                return Err(e).with_context(|| format!("Failed to delete zone {}", id));
            }
            emit!(AppEvent::Zone(ZoneEvent::Deleted { id }));
            println!("Deleted zone {}", id);
        }
        ZonesCommand::Save {
            name,
            zone_type,
            id,
            geometry,
        } => {
            let raw = app::read_geometry_arg(&geometry)?;
            let designer = ZoneDesigner::seeded(name, zone_type, InitialGeometry::Raw(raw));
            let payload = designer
                .save_payload()
                .context("Zone geometry is not a valid polygon")?;
            let saved = client
                .save_zone(id, &payload)
                .await
                .context("Failed to save zone")?;
            emit!(AppEvent::Zone(ZoneEvent::Saved {
                id: saved,
                name: payload.name.clone()
            }));
            println!("Saved zone '{}' as {}", payload.name, saved);
        }
    }

    Ok(())
}

pub fn validate(raw: &str) -> anyhow::Result<()> {
    let raw = app::read_geometry_arg(raw)?;
    let Some(parsed) = geometry::deserialize(&raw) else {
        bail!("Not a geometry document");
    };

    let designer = ZoneDesigner::seeded("", Default::default(), InitialGeometry::Decoded(parsed));
    println!("{}", designer.summary());
    match designer.validation() {
        Ok(()) => {
            let area = geometry::polygon_area(designer.points());
            println!("Valid polygon, area {:.1}", area);
            Ok(())
        }
        Err(e) => bail!("Invalid polygon: {}", e),
    }
}

pub async fn render(config: &Config, args: RenderArgs) -> anyhow::Result<()> {
    let raw = app::read_geometry_arg(&args.geometry)?;
    let designer = ZoneDesigner::seeded(args.name, args.zone_type, InitialGeometry::Raw(raw));
    if designer.points().is_empty() {
        tracing::warn!("Geometry has no points, rendering background only");
    }

    let mut config = config.clone();
    if let Some(width) = args.width {
        config.designer.canvas_width = width;
    }
    if let Some(height) = args.height {
        config.designer.canvas_height = height;
    }
    if let Some(dpr) = args.dpr {
        config.designer.device_pixel_ratio = dpr;
    }
    config.validate().context("Invalid canvas settings")?;

    let mut renderer = app::renderer(&config);
    if let Some(source) = &args.background {
        renderer.set_background(Some(app::load_background(source).await?));
    }

    renderer
        .render(&designer)
        .save(&args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    println!("Wrote {}", args.out.display());
    Ok(())
}

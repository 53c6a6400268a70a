//! Designer state for one open zone-editing session.
//!
//! Owns the draft polygon, the hover preview point, the zone metadata and the
//! viewport. All mutation happens through the methods below so the viewport
//! invariant (screen/world mapping stays an exact inverse) holds.

use std::fmt;

use anpr_console_core::PolygonError;

use crate::geometry;
use crate::model::{Geometry, Point, SavePayload, Zone, ZoneType};
use crate::viewport::ViewportTransform;

/// Where a designer draft starts from.
#[derive(Debug, Clone, Default)]
pub enum InitialGeometry {
    /// Blank canvas.
    #[default]
    None,
    /// An already decoded geometry.
    Decoded(Geometry),
    /// A stored geometry string, soft-parsed on open.
    Raw(String),
}

/// Zone draft plus viewport for the designer canvas.
#[derive(Debug, Clone)]
pub struct ZoneDesigner {
    name: String,
    zone_type: ZoneType,
    points: Vec<Point>,
    hover_point: Option<Point>,
    viewport: ViewportTransform,
}

impl ZoneDesigner {
    /// Creates an empty designer for a new zone.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            zone_type: ZoneType::default(),
            points: Vec::new(),
            hover_point: None,
            viewport: ViewportTransform::new(),
        }
    }

    /// Creates a designer seeded with metadata and an optional starting geometry.
    ///
    /// A stored string that fails to decode opens as an empty draft.
    pub fn seeded(name: impl Into<String>, zone_type: ZoneType, initial: InitialGeometry) -> Self {
        let geometry = match initial {
            InitialGeometry::None => None,
            InitialGeometry::Decoded(g) => Some(g),
            InitialGeometry::Raw(raw) => {
                let decoded = geometry::deserialize(&raw);
                if decoded.is_none() {
                    tracing::debug!("Stored geometry could not be decoded, opening empty draft");
                }
                decoded
            }
        };

        let mut designer = Self::new();
        designer.name = name.into();
        designer.zone_type = zone_type;
        if let Some(g) = geometry {
            designer.viewport = ViewportTransform::from_parts(g.scale, g.translation);
            designer.points = g.points;
        }
        designer
    }

    /// Opens an existing zone for editing.
    pub fn from_zone(zone: &Zone) -> Self {
        Self::seeded(
            zone.name.clone(),
            zone.zone_type,
            InitialGeometry::Decoded(zone.geometry.clone()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn zone_type(&self) -> ZoneType {
        self.zone_type
    }

    pub fn set_type(&mut self, zone_type: ZoneType) {
        self.zone_type = zone_type;
    }

    /// Draft vertices in world space, in insertion order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn hover_point(&self) -> Option<Point> {
        self.hover_point
    }

    pub fn viewport(&self) -> &ViewportTransform {
        &self.viewport
    }

    pub fn scale(&self) -> f64 {
        self.viewport.scale()
    }

    pub fn translation(&self) -> Point {
        self.viewport.translation()
    }

    /// Appends a vertex. Validation is deferred to finish/save.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Removes the last vertex, if any.
    pub fn undo(&mut self) -> Option<Point> {
        self.points.pop()
    }

    /// Drops all vertices and the hover preview. Name, type and viewport stay.
    pub fn clear(&mut self) {
        self.points.clear();
        self.hover_point = None;
    }

    pub fn set_hover_point(&mut self, point: Option<Point>) {
        self.hover_point = point;
    }

    /// Maps a pointer position to world coordinates.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.viewport.screen_to_world(screen)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        self.viewport.world_to_screen(world)
    }

    pub fn zoom_at_point(&mut self, wheel_delta: f64, origin: Point) {
        self.viewport.zoom_at_point(wheel_delta, origin);
    }

    pub fn pan_by(&mut self, screen_delta: Point) {
        self.viewport.pan_by(screen_delta);
    }

    /// Snapshot of the draft as a persistable geometry.
    pub fn geometry(&self) -> Geometry {
        Geometry::new(
            self.points.clone(),
            self.viewport.scale(),
            self.viewport.translation(),
        )
    }

    pub fn serialized_geometry(&self) -> String {
        geometry::serialize(&self.geometry())
    }

    /// Live validation of the current draft.
    pub fn validation(&self) -> Result<(), PolygonError> {
        geometry::validate_polygon(&self.points)
    }

    /// Payload for the host's save callback, gated on validation.
    pub fn save_payload(&self) -> Result<SavePayload, PolygonError> {
        self.validation()?;
        Ok(SavePayload {
            name: self.name.clone(),
            zone_type: self.zone_type,
            geometry: self.serialized_geometry(),
        })
    }

    /// Preview card contents.
    pub fn summary(&self) -> ZoneSummary {
        ZoneSummary {
            name: self.name.clone(),
            zone_type: self.zone_type,
            point_count: self.points.len(),
            scale: self.viewport.scale(),
            translation: self.viewport.translation(),
        }
    }
}

impl Default for ZoneDesigner {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only summary of a draft, shown next to the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSummary {
    pub name: String,
    pub zone_type: ZoneType,
    pub point_count: usize,
    pub scale: f64,
    pub translation: Point,
}

impl ZoneSummary {
    /// Name to show, falling back for unnamed drafts.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Untitled zone"
        } else {
            &self.name
        }
    }
}

impl fmt::Display for ZoneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.display_name())?;
        writeln!(f, "Type: {}", self.zone_type)?;
        writeln!(f, "Points: {}", self.point_count)?;
        write!(
            f,
            "Geometry is saved with scale {:.2} and translation ({:.1}, {:.1}).",
            self.scale, self.translation.x, self.translation.y
        )
    }
}

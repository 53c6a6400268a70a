//! Zone data model: points, persisted geometry and zone records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use crate::geometry;

/// A coordinate pair. Designer points are world-space, pointer positions are screen-space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Geometry discriminator. Only polygons exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeometryKind {
    #[default]
    Polygon,
}

fn default_scale() -> f64 {
    1.0
}

/// Persisted shape payload: polygon vertices plus the viewport used when it was saved.
///
/// Stored blobs written by older clients use `type` instead of `kind`; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(alias = "type")]
    pub kind: GeometryKind,
    pub points: Vec<Point>,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub translation: Point,
}

impl Geometry {
    pub fn new(points: Vec<Point>, scale: f64, translation: Point) -> Self {
        Self {
            kind: GeometryKind::Polygon,
            points,
            scale,
            translation,
        }
    }

    /// Whether this geometry passes the persistence gate.
    pub fn is_valid(&self) -> bool {
        geometry::validate_polygon(&self.points).is_ok()
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(Vec::new(), default_scale(), Point::ORIGIN)
    }
}

/// Zone role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ZoneType {
    #[default]
    Entry,
    Exit,
    Control,
}

impl ZoneType {
    pub const ALL: [ZoneType; 3] = [ZoneType::Entry, ZoneType::Exit, ZoneType::Control];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Entry => "Entry",
            ZoneType::Exit => "Exit",
            ZoneType::Control => "Control",
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown zone type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown zone type '{0}' (expected Entry, Exit or Control)")]
pub struct ParseZoneTypeError(pub String);

impl FromStr for ZoneType {
    type Err = ParseZoneTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ZoneType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseZoneTypeError(s.to_string()))
    }
}

/// A named polygon region. `id` is assigned by the backend and absent until persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: Option<i64>,
    pub name: String,
    pub zone_type: ZoneType,
    pub geometry: Geometry,
}

impl Zone {
    pub fn new(name: impl Into<String>, zone_type: ZoneType, geometry: Geometry) -> Self {
        Self {
            id: None,
            name: name.into(),
            zone_type,
            geometry,
        }
    }

    /// Build a zone from a stored record whose geometry is an opaque string.
    ///
    /// Corrupt or missing geometry yields an empty polygon rather than an error.
    pub fn from_stored(
        id: Option<i64>,
        name: impl Into<String>,
        zone_type: ZoneType,
        raw_geometry: Option<&str>,
    ) -> Self {
        let geometry = raw_geometry
            .and_then(geometry::deserialize)
            .unwrap_or_default();
        Self {
            id,
            name: name.into(),
            zone_type,
            geometry,
        }
    }
}

/// Payload handed to the host's save callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    /// Serialized [`Geometry`].
    pub geometry: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(4.0, 6.0);
        let b = Point::new(1.0, 2.0);
        assert_eq!(a - b, Point::new(3.0, 4.0));
        assert_eq!(a + b, Point::new(5.0, 8.0));
        assert_eq!(a * 0.5, Point::new(2.0, 3.0));
        assert_eq!(a / 2.0, Point::new(2.0, 3.0));
        assert_eq!((a - b).distance_to(&Point::ORIGIN), 5.0);
    }

    #[test]
    fn test_zone_type_parse() {
        assert_eq!("exit".parse::<ZoneType>(), Ok(ZoneType::Exit));
        assert_eq!(" Control ".parse::<ZoneType>(), Ok(ZoneType::Control));
        assert!("Parking".parse::<ZoneType>().is_err());
    }

    #[test]
    fn test_zone_from_corrupt_geometry_is_empty() {
        let zone = Zone::from_stored(Some(7), "Gate", ZoneType::Entry, Some("{not json"));
        assert_eq!(zone.id, Some(7));
        assert!(zone.geometry.points.is_empty());
        assert_eq!(zone.geometry.scale, 1.0);
    }

    #[test]
    fn test_save_payload_uses_type_key() {
        let payload = SavePayload {
            name: "Bay".to_string(),
            zone_type: ZoneType::Control,
            geometry: "{}".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "Control");
        assert_eq!(json["name"], "Bay");
    }
}

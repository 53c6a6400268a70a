//! Geometry kernel: pure polygon math, validation and the persisted text format.
//!
//! Every function here is stateless. Validation is a single function so the
//! "finish polygon" warning and the save-time gate can never disagree.

use anpr_console_core::constants::GEOMETRY_EPSILON;
use anpr_console_core::PolygonError;

use crate::model::{Geometry, Point};

/// Encode a geometry as the opaque JSON string the backend stores.
///
/// Field order is fixed (`kind`, `points`, `scale`, `translation`), so equal
/// geometries always produce identical text.
pub fn serialize(geometry: &Geometry) -> String {
    match serde_json::to_string(geometry) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Failed to serialize geometry: {}", e);
            String::new()
        }
    }
}

/// Decode a stored geometry string.
///
/// Never fails loudly: malformed JSON, an unknown `kind`, missing points or a
/// non-positive scale all yield `None`. Missing `scale` defaults to 1.0 and
/// missing `translation` to the origin.
pub fn deserialize(raw: &str) -> Option<Geometry> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let geometry: Geometry = match serde_json::from_str(raw) {
        Ok(g) => g,
        Err(e) => {
            tracing::debug!("Ignoring unparseable geometry: {}", e);
            return None;
        }
    };

    let finite = |p: &Point| p.x.is_finite() && p.y.is_finite();
    if !(geometry.scale.is_finite() && geometry.scale > 0.0)
        || !finite(&geometry.translation)
        || !geometry.points.iter().all(finite)
    {
        tracing::debug!("Ignoring geometry with non-finite or non-positive values");
        return None;
    }

    Some(geometry)
}

/// Number of vertices, treating "no geometry" as zero.
pub fn point_count(geometry: Option<&Geometry>) -> usize {
    geometry.map_or(0, |g| g.points.len())
}

/// Unsigned polygon area by the shoelace formula. Fewer than three points give 0.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice_area.abs() / 2.0
}

/// Z component of `(q - p) x (r - p)`.
fn cross(p: &Point, q: &Point, r: &Point) -> f64 {
    (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
}

/// Sign with an exact zero, unlike `f64::signum`.
fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// `c` lies on segment `ab` (within the epsilon box and collinear).
fn on_segment(a: &Point, b: &Point, c: &Point) -> bool {
    a.x.min(b.x) - GEOMETRY_EPSILON <= c.x
        && c.x <= a.x.max(b.x) + GEOMETRY_EPSILON
        && a.y.min(b.y) - GEOMETRY_EPSILON <= c.y
        && c.y <= a.y.max(b.y) + GEOMETRY_EPSILON
        && cross(a, b, c).abs() < GEOMETRY_EPSILON
}

/// Segment `p1p2` crosses or touches segment `p3p4`.
fn segments_intersect(p1: &Point, p2: &Point, p3: &Point, p4: &Point) -> bool {
    let d1 = cross(p1, p2, p3);
    let d2 = cross(p1, p2, p4);
    let d3 = cross(p3, p4, p1);
    let d4 = cross(p3, p4, p2);

    if sign(d1) != sign(d2) && sign(d3) != sign(d4) {
        return true;
    }

    (d1.abs() < GEOMETRY_EPSILON && on_segment(p1, p2, p3))
        || (d2.abs() < GEOMETRY_EPSILON && on_segment(p1, p2, p4))
        || (d3.abs() < GEOMETRY_EPSILON && on_segment(p3, p4, p1))
        || (d4.abs() < GEOMETRY_EPSILON && on_segment(p3, p4, p2))
}

/// Pairwise edge test over the closed ring, O(n²).
///
/// Edges sharing a vertex are never compared, so a crossing needs at least
/// four points.
pub fn is_self_intersecting(points: &[Point]) -> bool {
    let n = points.len();
    if n < 4 {
        return false;
    }

    for i in 0..n {
        let a1 = &points[i];
        let a2 = &points[(i + 1) % n];
        for j in (i + 1)..n {
            // adjacent edges, including the closing edge back to vertex 0
            if j - i <= 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let b1 = &points[j];
            let b2 = &points[(j + 1) % n];
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

/// Decide whether a vertex list may be persisted.
///
/// Checks run in order: vertex count, self-intersection, area.
pub fn validate_polygon(points: &[Point]) -> Result<(), PolygonError> {
    if points.len() < 3 {
        return Err(PolygonError::TooFewPoints);
    }
    if is_self_intersecting(points) {
        return Err(PolygonError::SelfIntersecting);
    }
    if polygon_area(points) < GEOMETRY_EPSILON {
        return Err(PolygonError::AreaTooSmall);
    }
    Ok(())
}

/// Even-odd ray cast: is `p` inside the closed ring?
pub fn contains_point(points: &[Point], p: &Point) -> bool {
    if points.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (&points[i], &points[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let dy = pj.y - pi.y;
            let dy = if dy == 0.0 { GEOMETRY_EPSILON } else { dy };
            if p.x < (pj.x - pi.x) * (p.y - pi.y) / dy + pi.x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

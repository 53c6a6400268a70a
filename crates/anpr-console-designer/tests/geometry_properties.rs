//! Geometry kernel and viewport property tests

use anpr_console_core::constants::{MAX_SCALE, MIN_SCALE};
use anpr_console_core::PolygonError;
use anpr_console_designer::{
    deserialize, is_self_intersecting, polygon_area, serialize, validate_polygon, Geometry,
    Point, ViewportTransform,
};
use proptest::prelude::*;

fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
    coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

#[test]
fn test_unit_square_is_valid() {
    let square = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
    assert_eq!(polygon_area(&square), 100.0);
    assert!(!is_self_intersecting(&square));
    assert_eq!(validate_polygon(&square), Ok(()));
}

#[test]
fn test_bowtie_is_self_intersecting() {
    let bowtie = pts(&[(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)]);
    assert!(is_self_intersecting(&bowtie));
    assert_eq!(
        validate_polygon(&bowtie),
        Err(PolygonError::SelfIntersecting)
    );
    assert_eq!(
        validate_polygon(&bowtie).unwrap_err().to_string(),
        "self-intersecting"
    );
}

#[test]
fn test_deserialize_fails_soft() {
    for raw in [
        "",
        "not json",
        "[1,2,3]",
        "null",
        r#"{"kind":"Circle","points":[],"scale":1}"#,
        r#"{"type":"Line","points":[]}"#,
        r#"{"kind":"Polygon"}"#,
        r#"{"kind":"Polygon","points":[{"x":"a","y":1}]}"#,
    ] {
        assert!(deserialize(raw).is_none(), "accepted {:?}", raw);
    }
}

#[test]
fn test_deserialize_fills_defaults_and_legacy_key() {
    let g = deserialize(r#"{"type":"Polygon","points":[{"x":1.5,"y":-2}]}"#).unwrap();
    assert_eq!(g.points, vec![Point::new(1.5, -2.0)]);
    assert_eq!(g.scale, 1.0);
    assert_eq!(g.translation, Point::ORIGIN);
}

#[test]
fn test_serialize_field_order() {
    let g = Geometry::new(vec![Point::new(1.0, 2.0)], 1.5, Point::new(3.0, 4.0));
    assert_eq!(
        serialize(&g),
        r#"{"kind":"Polygon","points":[{"x":1.0,"y":2.0}],"scale":1.5,"translation":{"x":3.0,"y":4.0}}"#
    );
}

#[test]
fn test_round_trip_keeps_every_bit() {
    let p = Point::new(471.9790529752886, 157.32635099176287);
    let g = Geometry::new(vec![p], 1.0, Point::new(0.1 + 0.2, -1.0 / 3.0));
    let back = deserialize(&serialize(&g)).unwrap();
    assert_eq!(back.points[0].x.to_bits(), p.x.to_bits());
    assert_eq!(back.points[0].y.to_bits(), p.y.to_bits());
    assert_eq!(back.translation, g.translation);
}

fn point_strategy() -> impl Strategy<Value = Point> {
    (-1.0e4..1.0e4f64, -1.0e4..1.0e4f64).prop_map(|(x, y)| Point::new(x, y))
}

proptest! {
    #[test]
    fn fewer_than_three_points_is_too_few(points in prop::collection::vec(point_strategy(), 0..3)) {
        prop_assert_eq!(validate_polygon(&points), Err(PolygonError::TooFewPoints));
    }

    #[test]
    fn serialize_round_trip(
        points in prop::collection::vec(point_strategy(), 0..24),
        scale in 0.2..5.0f64,
        translation in point_strategy(),
    ) {
        let g = Geometry::new(points, scale, translation);
        let back = deserialize(&serialize(&g)).expect("serialized geometry must parse");

        prop_assert_eq!(&back.points, &g.points);
        prop_assert_eq!(back.scale, g.scale);
        prop_assert_eq!(back.translation, g.translation);
    }

    #[test]
    fn screen_to_world_inverts_render_transform(
        scale in 0.2..5.0f64,
        translation in point_strategy(),
        p in point_strategy(),
    ) {
        let vp = ViewportTransform::from_parts(scale, translation);
        let back = vp.world_to_screen(vp.screen_to_world(p));
        prop_assert!((back.x - p.x).abs() < 1e-6);
        prop_assert!((back.y - p.y).abs() < 1e-6);
    }

    #[test]
    fn zoom_keeps_anchor_and_clamps(
        scale in 0.2..5.0f64,
        translation in point_strategy(),
        origin in point_strategy(),
        delta in -1.0e5..1.0e5f64,
    ) {
        let mut vp = ViewportTransform::from_parts(scale, translation);
        let anchor = vp.screen_to_world(origin);

        vp.zoom_at_point(delta, origin);

        prop_assert!(vp.scale() >= MIN_SCALE && vp.scale() <= MAX_SCALE);
        let after = vp.world_to_screen(anchor);
        prop_assert!((after.x - origin.x).abs() < 1e-6);
        prop_assert!((after.y - origin.y).abs() < 1e-6);
    }
}

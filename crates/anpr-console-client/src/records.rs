//! Wire records returned by the backend.

use serde::Deserialize;
use serde_json::Value;

use anpr_console_designer::{Zone, ZoneType};
use anpr_console_stream::PlateEvent;

/// A zone as stored by the backend.
///
/// `geometry` is usually the opaque string the designer produced, but older
/// rows hold it as a JSON object.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub zone_type: Option<String>,
    #[serde(default)]
    pub geometry: Value,
    #[serde(default)]
    pub color: Option<String>,
}

impl ZoneRecord {
    /// Raw geometry text, if the record carries any.
    pub fn raw_geometry(&self) -> Option<String> {
        match &self.geometry {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => Some(self.geometry.to_string()),
            _ => None,
        }
    }

    /// Converts to the designer model. Unknown types fall back to Entry and
    /// corrupt geometry to an empty polygon.
    pub fn into_zone(self) -> Zone {
        let zone_type = match self.zone_type.as_deref() {
            None | Some("") => ZoneType::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Zone {:?}: {}", self.id, e);
                ZoneType::default()
            }),
        };
        let raw = self.raw_geometry();
        Zone::from_stored(self.id, self.name, zone_type, raw.as_deref())
    }
}

/// Search responses come either as a bare array or wrapped in `results`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SearchResponse {
    List(Vec<Value>),
    Wrapped { results: Vec<Value> },
}

impl SearchResponse {
    /// Decodes the events, skipping entries without a plate.
    pub(crate) fn into_events(self) -> Vec<PlateEvent> {
        let (SearchResponse::List(items) | SearchResponse::Wrapped { results: items }) = self;
        let total = items.len();
        let events: Vec<PlateEvent> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        if events.len() < total {
            tracing::warn!(
                "Skipped {} search results without a plate",
                total - events.len()
            );
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_record_with_string_geometry() {
        let record: ZoneRecord = serde_json::from_str(
            r#"{"id":4,"name":"Gate","type":"Exit","geometry":"{\"kind\":\"Polygon\",\"points\":[{\"x\":1,\"y\":2}]}"}"#,
        )
        .unwrap();
        let zone = record.into_zone();
        assert_eq!(zone.id, Some(4));
        assert_eq!(zone.zone_type, ZoneType::Exit);
        assert_eq!(zone.geometry.points.len(), 1);
    }

    #[test]
    fn test_zone_record_with_object_geometry_and_no_type() {
        let record: ZoneRecord = serde_json::from_str(
            r#"{"id":1,"name":"Lot","geometry":{"type":"Polygon","points":[],"scale":2}}"#,
        )
        .unwrap();
        let zone = record.into_zone();
        assert_eq!(zone.zone_type, ZoneType::Entry);
        assert_eq!(zone.geometry.scale, 2.0);
    }

    #[test]
    fn test_corrupt_geometry_opens_empty() {
        let record: ZoneRecord =
            serde_json::from_str(r#"{"id":2,"name":"X","type":"weird","geometry":"oops"}"#).unwrap();
        let zone = record.into_zone();
        assert!(zone.geometry.points.is_empty());
        assert_eq!(zone.zone_type, ZoneType::Entry);
    }

    #[test]
    fn test_search_response_shapes() {
        let bare: SearchResponse =
            serde_json::from_str(r#"[{"id":1,"plate_text":"A1"},{"id":2}]"#).unwrap();
        assert_eq!(bare.into_events().len(), 1);

        let wrapped: SearchResponse =
            serde_json::from_str(r#"{"results":[{"plate":"B2"},{"plate":"C3"}]}"#).unwrap();
        let events = wrapped.into_events();
        assert_eq!(events[1].plate, "C3");
    }
}

//! Plate event model and push payload normalisation.
//!
//! The backend and the edge pipeline disagree on a few field names
//! (`plate` vs `plate_text`, `thumbnail_url` vs `crop_url`) and sometimes send
//! ids as strings. Everything is folded into one canonical [`PlateEvent`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single plate detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlateEvent")]
pub struct PlateEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub plate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// ISO-8601 text as sent by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl PlateEvent {
    /// Creates an event with only a plate set.
    pub fn new(plate: impl Into<String>) -> Self {
        Self {
            id: None,
            plate: plate.into(),
            camera_id: None,
            camera_name: None,
            zone_id: None,
            zone_name: None,
            confidence: None,
            timestamp: None,
            thumbnail_url: None,
            meta: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Applies a newer message for the same detection.
    ///
    /// Fields the update omits keep their current value. `plate` is always
    /// present on an update and always wins.
    pub fn overlay(&mut self, update: PlateEvent) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        self.plate = update.plate;
        take(&mut self.id, update.id);
        take(&mut self.camera_id, update.camera_id);
        take(&mut self.camera_name, update.camera_name);
        take(&mut self.zone_id, update.zone_id);
        take(&mut self.zone_name, update.zone_name);
        take(&mut self.confidence, update.confidence);
        take(&mut self.timestamp, update.timestamp);
        take(&mut self.thumbnail_url, update.thumbnail_url);
        take(&mut self.meta, update.meta);
    }
}

/// Rejection reason for a payload that is not a plate event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("payload carries no plate")]
pub struct MissingPlate;

/// Wire shape accepted from the search endpoint and the push channel.
#[derive(Debug, Deserialize)]
struct RawPlateEvent {
    #[serde(default, deserialize_with = "lenient_int")]
    id: Option<i64>,
    #[serde(default)]
    plate: Option<String>,
    #[serde(default)]
    plate_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    camera_id: Option<i64>,
    #[serde(default)]
    camera_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    zone_id: Option<i64>,
    #[serde(default)]
    zone_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_float")]
    confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    timestamp: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    crop_url: Option<String>,
    #[serde(default)]
    meta: Option<Value>,
}

impl TryFrom<RawPlateEvent> for PlateEvent {
    type Error = MissingPlate;

    fn try_from(raw: RawPlateEvent) -> Result<Self, Self::Error> {
        let plate = [raw.plate, raw.plate_text]
            .into_iter()
            .flatten()
            .map(|p| p.trim().to_string())
            .find(|p| !p.is_empty())
            .ok_or(MissingPlate)?;

        Ok(Self {
            id: raw.id,
            plate,
            camera_id: raw.camera_id,
            camera_name: raw.camera_name,
            zone_id: raw.zone_id,
            zone_name: raw.zone_name,
            confidence: raw.confidence,
            timestamp: raw.timestamp,
            thumbnail_url: raw.thumbnail_url.or(raw.crop_url),
            meta: raw.meta.filter(|m| !m.is_null()),
        })
    }
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|f: &f64| f.is_finite()))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Parses one push-channel message.
///
/// Returns `None` for anything that is not a plate event: invalid JSON,
/// non-object payloads and plateless messages such as the server greeting.
pub fn normalize_message(text: &str) -> Option<PlateEvent> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Dropping unparseable stream message: {}", e);
            return None;
        }
    };
    if !value.is_object() {
        tracing::warn!("Dropping non-object stream message");
        return None;
    }
    match serde_json::from_value::<PlateEvent>(value) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!("Ignoring stream message without plate: {}", e);
            None
        }
    }
}

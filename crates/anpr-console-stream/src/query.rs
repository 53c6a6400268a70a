//! Filter and search parameters shared by the push channel and the search endpoint.

use anpr_console_core::constants::{DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Filter applied to the live feed. Empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamFilter {
    /// Plate substring, matched case-insensitively by the server.
    pub plate: Option<String>,
    pub camera_id: Option<i64>,
    pub zone_id: Option<i64>,
    pub min_confidence: Option<f64>,
}

impl StreamFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plate(mut self, plate: impl Into<String>) -> Self {
        self.plate = Some(plate.into());
        self
    }

    pub fn with_camera(mut self, camera_id: i64) -> Self {
        self.camera_id = Some(camera_id);
        self
    }

    pub fn with_zone(mut self, zone_id: i64) -> Self {
        self.zone_id = Some(zone_id);
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    /// Query-string pairs in a fixed order.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(plate) = self.plate.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            pairs.push(("plate", plate.to_string()));
        }
        if let Some(id) = self.camera_id {
            pairs.push(("camera_id", id.to_string()));
        }
        if let Some(id) = self.zone_id {
            pairs.push(("zone_id", id.to_string()));
        }
        if let Some(c) = self.min_confidence.filter(|c| c.is_finite()) {
            pairs.push(("min_confidence", c.to_string()));
        }
        pairs
    }
}

/// Sort direction for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Full request for the event search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub filter: StreamFilter,
    pub from_ts: Option<DateTime<Utc>>,
    pub to_ts: Option<DateTime<Utc>>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            filter: StreamFilter::default(),
            from_ts: None,
            to_ts: None,
            sort: None,
            order: None,
            limit: DEFAULT_SEARCH_LIMIT,
            offset: 0,
        }
    }
}

impl SearchQuery {
    pub fn from_filter(filter: StreamFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// Sets the page size, clamped to what the server accepts.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_range(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from_ts = from;
        self.to_ts = to;
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(field.into());
        self.order = Some(order);
        self
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.filter.to_query_pairs();
        if let Some(ts) = self.from_ts {
            pairs.push(("from_ts", ts.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(ts) = self.to_ts {
            pairs.push(("to_ts", ts.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(sort) = self.sort.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("sort", sort.to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.as_str().to_string()));
        }
        pairs.push(("limit", self.limit.clamp(1, MAX_SEARCH_LIMIT).to_string()));
        pairs.push(("offset", self.offset.to_string()));
        pairs
    }
}

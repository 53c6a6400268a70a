//! Fixed tuning constants shared across the console crates.

/// Smallest viewport zoom factor the designer allows.
pub const MIN_SCALE: f64 = 0.2;

/// Largest viewport zoom factor the designer allows.
pub const MAX_SCALE: f64 = 5.0;

/// Scale change per wheel delta unit (`factor = 1 - delta * ZOOM_SENSITIVITY`).
pub const ZOOM_SENSITIVITY: f64 = 0.001;

/// Tolerance for collinearity tests and the minimum polygon area (world units squared).
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// Maximum number of live plate events retained client-side.
pub const EVENT_BUFFER_CAPACITY: usize = 200;

/// Polling period used once the push channel has failed or closed.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

/// Default page size requested from the search endpoint.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Upper bound the search endpoint accepts for `limit`.
pub const MAX_SEARCH_LIMIT: u32 = 500;

/// Vertex marker radius in screen pixels.
pub const VERTEX_RADIUS_PX: f64 = 4.0;

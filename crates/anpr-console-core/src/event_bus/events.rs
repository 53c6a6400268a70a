//! Event type definitions for the event bus.
//!
//! Events are grouped by the component that emits them and are cloneable and
//! serializable so a host can log or forward them.

use serde::{Deserialize, Serialize};

/// Root event enum for all application events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Zone designer notifications
    Designer(DesignerEvent),
    /// Live event stream notifications
    Stream(StreamEvent),
    /// Zone persistence results reported by the host
    Zone(ZoneEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Designer(_) => EventCategory::Designer,
            AppEvent::Stream(_) => EventCategory::Stream,
            AppEvent::Zone(_) => EventCategory::Zone,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Designer(e) => e.description(),
            AppEvent::Stream(e) => e.description(),
            AppEvent::Zone(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Zone designer events.
    Designer,
    /// Live stream events.
    Stream,
    /// Zone persistence events.
    Zone,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Designer => write!(f, "Designer"),
            EventCategory::Stream => write!(f, "Stream"),
            EventCategory::Zone => write!(f, "Zone"),
        }
    }
}

/// Designer notifications (the "toast" surface of the designer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DesignerEvent {
    /// Finish passed validation.
    PolygonClosed {
        /// Number of vertices in the closed polygon.
        points: usize,
    },
    /// Finish or save was rejected by validation.
    ValidationFailed {
        /// Human readable reason.
        reason: String,
    },
    /// A save payload was handed to the host.
    SaveRequested {
        /// Zone name in the payload.
        name: String,
    },
    /// The designer session was closed.
    Closed,
}

impl DesignerEvent {
    fn description(&self) -> String {
        match self {
            DesignerEvent::PolygonClosed { points } => {
                format!("Polygon closed with {} points", points)
            }
            DesignerEvent::ValidationFailed { reason } => format!("Polygon invalid: {}", reason),
            DesignerEvent::SaveRequested { name } => format!("Saving zone '{}'", name),
            DesignerEvent::Closed => "Designer closed".to_string(),
        }
    }
}

/// Push channel connection status.
///
/// Moves `Idle -> Connecting -> Open -> (Closed | Error)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// No channel has been requested yet.
    #[default]
    Idle,
    /// Channel is being opened.
    Connecting,
    /// Channel is delivering events.
    Open,
    /// Channel closed (by the server or by teardown).
    Closed,
    /// Channel failed.
    Error(String),
}

impl ConnectionStatus {
    /// True once the channel is no longer usable and polling should cover for it.
    pub fn is_degraded(&self) -> bool {
        matches!(self, ConnectionStatus::Closed | ConnectionStatus::Error(_))
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Idle => write!(f, "idle"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Open => write!(f, "open"),
            ConnectionStatus::Closed => write!(f, "closed"),
            ConnectionStatus::Error(reason) => write!(f, "error ({})", reason),
        }
    }
}

/// Live stream notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    /// Connection status changed.
    StatusChanged {
        /// The new status.
        status: ConnectionStatus,
    },
    /// Polling fallback started.
    PollingStarted {
        /// Poll period in milliseconds.
        interval_ms: u64,
    },
    /// Buffer was replaced by a full refetch.
    EventsReplaced {
        /// Number of events installed.
        count: usize,
    },
}

impl StreamEvent {
    fn description(&self) -> String {
        match self {
            StreamEvent::StatusChanged { status } => format!("Stream status: {}", status),
            StreamEvent::PollingStarted { interval_ms } => {
                format!("Falling back to polling every {}ms", interval_ms)
            }
            StreamEvent::EventsReplaced { count } => format!("Loaded {} events", count),
        }
    }
}

/// Zone persistence results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ZoneEvent {
    /// Zone stored by the backend.
    Saved {
        /// Assigned id.
        id: i64,
        /// Zone name.
        name: String,
    },
    /// Zone removed by the backend.
    Deleted {
        /// Removed id.
        id: i64,
    },
    /// A persistence request failed.
    RequestFailed {
        /// Error text.
        error: String,
    },
}

impl ZoneEvent {
    fn description(&self) -> String {
        match self {
            ZoneEvent::Saved { id, name } => format!("Zone '{}' saved as #{}", name, id),
            ZoneEvent::Deleted { id } => format!("Zone #{} deleted", id),
            ZoneEvent::RequestFailed { error } => format!("Zone request failed: {}", error),
        }
    }
}

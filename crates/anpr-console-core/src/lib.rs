//! # ANPR Console Core
//!
//! Core types, errors and utilities shared by the ANPR operations console crates.
//! Provides the error taxonomy, fixed tuning constants and the application
//! event bus used to surface notifications to whatever host embeds the designer
//! or the live event feed.

pub mod constants;
pub mod error;
pub mod event_bus;

pub use error::{ApiError, ConnectionError, Error, PolygonError, Result};

// Re-export event bus for convenience
pub use event_bus::{
    event_bus, AppEvent, ConnectionStatus, DesignerEvent, EventBus, EventBusConfig,
    EventCategory, EventFilter, StreamEvent, ZoneEvent,
};

//! # Event Bus Module
//!
//! Notifications from the designer and the live event feed to the host that
//! displays them. Publishers emit typed events without knowing who listens.
//!
//! ```rust,ignore
//! use anpr_console_core::event_bus::{event_bus, AppEvent, EventCategory, EventFilter};
//!
//! event_bus().subscribe(EventFilter::Categories(vec![EventCategory::Stream]), |event| {
//!     if let AppEvent::Stream(stream) = event {
//!         println!("Stream event: {:?}", stream);
//!     }
//! });
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;

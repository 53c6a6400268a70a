//! # ANPR Console Client
//!
//! HTTP access to the backend: zone configuration CRUD and stored-event
//! search. [`ApiClient`] also implements [`anpr_console_stream::EventSearch`]
//! so the reconciler can poll through it.

pub mod client;
pub mod records;

pub use client::{ApiClient, ApiPaths, DEFAULT_TIMEOUT};
pub use records::ZoneRecord;

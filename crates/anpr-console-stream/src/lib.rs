//! # ANPR Console Stream
//!
//! Live plate-event feed for the operations dashboard.
//!
//! - [`EventBuffer`]: bounded, newest-first, merge-by-id event list
//! - [`EventStreamReconciler`]: push channel with polling fallback feeding the buffer
//! - [`WebSocketConnector`]: push channel over the backend's stream socket
//! - [`PlateEvent`] / [`normalize_message`]: canonical event shape
//!
//! The request/response side ([`EventSearch`]) is implemented by the HTTP
//! client crate.

pub mod buffer;
pub mod channel;
pub mod event;
pub mod query;
pub mod reconciler;
pub mod websocket;

pub use buffer::{EventBuffer, MergeOutcome};
pub use channel::{EventSearch, PushChannel, PushConnector};
pub use event::{normalize_message, MissingPlate, PlateEvent};
pub use query::{SearchQuery, SortOrder, StreamFilter};
pub use reconciler::{EventStreamReconciler, ReconcilerConfig};
pub use websocket::{stream_url, WebSocketChannel, WebSocketConnector};

//! Transport seams for the live feed.
//!
//! The reconciler only talks to these traits; the WebSocket implementation
//! lives in [`crate::websocket`] and the HTTP search client in the client crate.

use async_trait::async_trait;

use anpr_console_core::{ApiError, ConnectionError};

use crate::event::PlateEvent;
use crate::query::{SearchQuery, StreamFilter};

/// An open push channel delivering one JSON document per message.
#[async_trait]
pub trait PushChannel: Send {
    /// Next text message. `None` once the server closed the channel.
    async fn next_message(&mut self) -> Option<Result<String, ConnectionError>>;

    /// Closes the channel from the client side.
    async fn close(&mut self);
}

/// Opens push channels scoped by a filter.
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(&self, filter: &StreamFilter)
        -> Result<Box<dyn PushChannel>, ConnectionError>;
}

/// Request/response access to stored events, used for refetch and polling.
#[async_trait]
pub trait EventSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<PlateEvent>, ApiError>;
}

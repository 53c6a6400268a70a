//! Error handling for the ANPR console
//!
//! Provides error types for all layers of the console:
//! - Polygon validation failures (recovered locally, shown inline)
//! - API errors (persistence and search requests)
//! - Connection errors (push channel lifecycle)
//!
//! All error types use `thiserror` for ergonomic error handling.
//! Geometry deserialization deliberately has no error type: corrupt
//! geometry is reported as `None` and treated like "no geometry yet".

use thiserror::Error;

/// Reason a polygon is not valid for persistence.
///
/// Checked in this order: vertex count, self-intersection, area.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonError {
    /// Fewer than three vertices
    #[error("needs at least 3 points")]
    TooFewPoints,

    /// Two non-adjacent edges cross or overlap
    #[error("self-intersecting")]
    SelfIntersecting,

    /// Enclosed area below the geometry epsilon
    #[error("area too small")]
    AreaTooSmall,
}

/// Errors from the external persistence and search APIs.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// The server answered with a non-2xx status
    #[error("Request failed with status {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error body returned by the server.
        body: String,
    },

    /// The request never produced a response
    #[error("Transport error: {reason}")]
    Transport {
        /// Underlying transport failure.
        reason: String,
    },

    /// The response body could not be decoded
    #[error("Failed to decode response: {reason}")]
    Decode {
        /// Decoder failure description.
        reason: String,
    },

    /// A request URL could not be built from the configured base
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
    },
}

/// Push channel lifecycle errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Opening the channel failed
    #[error("Failed to connect to {url}: {reason}")]
    Connect {
        /// Endpoint that was dialled.
        url: String,
        /// Failure description.
        reason: String,
    },

    /// The open channel reported an error
    #[error("Channel error: {reason}")]
    Channel {
        /// Failure description.
        reason: String,
    },

    /// A channel is already open for this reconciler
    #[error("Push channel already connected")]
    AlreadyConnected,

    /// The owning view has been torn down
    #[error("Reconciler has been torn down")]
    TornDown,
}

/// Main error type for the console crates
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry validation failure
    #[error(transparent)]
    Polygon(#[from] PolygonError),

    /// External API failure
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Push channel failure
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Polygon(_))
    }

    /// Check if this is an API error
    pub fn is_api_error(&self) -> bool {
        matches!(self, Error::Api(_))
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}

/// Result type alias for console operations
pub type Result<T> = std::result::Result<T, Error>;

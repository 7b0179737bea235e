//! Stream transport error types.

use thiserror::Error;

/// Stream transport error type.
#[derive(Debug, Error)]
pub enum StreamError {
    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No live stream connection
    #[error("Not connected to the collection service")]
    NotConnected,

    /// Registration has not completed
    #[error("Device is not registered on the stream")]
    NotRegistered,

    /// A delivery is already awaiting its acknowledgment
    #[error("A stream delivery is already in flight")]
    DeliveryInFlight,

    /// No acknowledgment arrived within the timeout
    #[error("Timed out waiting for acknowledgment")]
    AckTimeout,

    /// Connection closed while a delivery was outstanding
    #[error("Stream connection closed")]
    Closed,

    /// Send error
    #[error("Failed to send frame: {0}")]
    Send(String),
}

/// Result type alias using StreamError.
pub type StreamResult<T> = Result<T, StreamError>;

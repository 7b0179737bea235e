//! Delivery outcome.

use serde_json::Value;

/// Terminal outcome of one delivery attempt.
///
/// Exactly one is produced per [`send`](crate::DeliveryController::send)
/// call; the controller's own retry/fallback policy runs before it is
/// returned, never after.
#[derive(Debug, Clone)]
pub enum DeliveryResult {
    /// The collection service accepted the reading.
    Success {
        /// Server acknowledgment payload.
        ack: Value,
    },
    /// The collection service answered with a non-success status.
    ///
    /// The body is preserved verbatim for operator display; callers must
    /// not treat this as fatal to the process.
    Rejected {
        /// The HTTP status code.
        status: u16,
        /// The response body text.
        body: String,
    },
    /// The reading could not be delivered over any transport.
    TransportError {
        /// What went wrong.
        cause: String,
    },
}

impl DeliveryResult {
    /// Whether the reading was accepted.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

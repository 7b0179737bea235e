//! Request transport error types.

use thiserror::Error;

/// Request transport error type.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Network or transport-level HTTP error from reqwest.
    ///
    /// Includes connection failures, timeouts, and TLS errors.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collection service returned a non-201 status.
    ///
    /// The body is preserved verbatim for operator display.
    #[error("rejected by collection service: {status} - {body}")]
    Rejected {
        /// The HTTP status code.
        status: u16,
        /// The response body text.
        body: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using RequestError.
pub type RequestResult<T> = Result<T, RequestError>;

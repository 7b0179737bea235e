//! Request/response transport for the FieldSense agent.
//!
//! One-shot HTTP delivery of a reading; used directly in http-only
//! mode and as the fallback when the stream transport fails.

mod error;
mod transport;

pub use error::{RequestError, RequestResult};
pub use transport::{RequestConfig, RequestTransport};

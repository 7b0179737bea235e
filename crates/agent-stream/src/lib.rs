//! Stream transport for the FieldSense agent.
//!
//! This crate provides:
//! - WebSocket connection to the collection service
//! - Automatic reconnection with exponential backoff
//! - Device registration before any data is emitted
//! - Acknowledgment correlation for emitted readings

mod backoff;
mod client;
mod error;
mod messages;

pub use backoff::reconnect_delay_secs;
pub use client::{ConnectionState, StreamClient, StreamConfig, StreamEvent};
pub use error::{StreamError, StreamResult};
pub use messages::{EventName, Frame};

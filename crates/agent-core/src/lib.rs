//! Shared configuration, logging, and error types for the FieldSense agent.

mod config;
mod error;
mod logging;

pub use config::{
    Config, TransportChoice, DEFAULT_ACK_TIMEOUT_SECS, DEFAULT_BASE_URL, DEFAULT_LOG_LEVEL,
    DEFAULT_SEND_INTERVAL_SECS, DEFAULT_SERIAL_NUMBER,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;

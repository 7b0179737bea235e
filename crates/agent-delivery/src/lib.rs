//! Delivery controller for the FieldSense agent.
//!
//! Single entry point for delivering a reading: validates it, prefers
//! the stream transport when the device is registered, awaits the
//! correlated acknowledgment with a bounded timeout, and falls back to
//! the HTTP transport when the stream cannot deliver.

mod controller;
mod result;

pub use controller::{DeliveryConfig, DeliveryController};
pub use result::DeliveryResult;

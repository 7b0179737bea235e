//! Wire frames exchanged with the collection service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event names on the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    // Outbound
    RegisterDevice,
    SensorData,

    // Inbound
    Registered,
    SensorDataAck,
    Error,
}

/// A frame sent to or received from the collection service.
///
/// Frames are JSON text messages of the form `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// The event name.
    pub event: EventName,
    /// Event payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Emission time, RFC 3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Frame {
    /// Create a new frame with the current timestamp.
    pub fn new(event: EventName) -> Self {
        Self {
            event,
            data: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Create a `register_device` frame.
    pub fn register_device(serial_number: &str, device_type: &str) -> Self {
        Self::new(EventName::RegisterDevice).with_data(serde_json::json!({
            "serial_number": serial_number,
            "device_type": device_type,
        }))
    }

    /// Create a `sensor_data` frame carrying a reading payload.
    pub fn sensor_data(payload: Value) -> Self {
        Self::new(EventName::SensorData).with_data(payload)
    }

    /// Set the payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

//! The sensor reading record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation error for a malformed reading.
///
/// A reading that fails validation is never sent over either transport.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadingError {
    /// A metric is NaN or infinite.
    #[error("metric '{field}' is not a finite number")]
    NonFinite {
        /// The offending field name.
        field: &'static str,
    },

    /// The serial number is empty.
    #[error("serial number is empty")]
    MissingSerial,
}

/// One sampled set of field metrics.
///
/// Immutable after creation; serialized flat as the wire payload for
/// both the stream and the HTTP transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Device serial number.
    pub serial_number: String,
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Soil temperature in °C.
    pub soil_temperature: f64,
    /// Soil moisture in %.
    pub soil_moisture: f64,
    /// Livestock body temperature in °C.
    pub livestock_temperature: f64,
    /// Sample time.
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    /// The five metric fields, by name.
    pub fn metrics(&self) -> [(&'static str, f64); 5] {
        [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("soil_temperature", self.soil_temperature),
            ("soil_moisture", self.soil_moisture),
            ("livestock_temperature", self.livestock_temperature),
        ]
    }

    /// Check that all metric fields are present and finite.
    pub fn validate(&self) -> Result<(), ReadingError> {
        if self.serial_number.trim().is_empty() {
            return Err(ReadingError::MissingSerial);
        }
        for (field, value) in self.metrics() {
            if !value.is_finite() {
                return Err(ReadingError::NonFinite { field });
            }
        }
        Ok(())
    }
}

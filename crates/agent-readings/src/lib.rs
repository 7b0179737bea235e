//! Sensor reading data model and sources for the FieldSense agent.
//!
//! A [`Reading`] is one sampled set of field metrics plus the device
//! identity and a timestamp. Readings come from a [`ReadingSource`];
//! without real sensor hardware the [`SimulatedSource`] stands in,
//! drawing values from plausible ranges.

mod reading;
mod source;

pub use reading::{Reading, ReadingError};
pub use source::{ReadingSource, SimulatedSource};

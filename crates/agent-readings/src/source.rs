//! Reading sources.

use crate::Reading;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces one reading per delivery cycle.
///
/// Implementations must not block longer than a short bounded duration;
/// the delivery loop calls this on every tick.
pub trait ReadingSource: Send {
    /// Sample the sensors and produce the next reading.
    fn next_reading(&mut self) -> Reading;
}

/// Simulated sensor source.
///
/// Stands in for real sensor drivers: each metric is drawn uniformly
/// from the range the hardware would report, rounded to one decimal.
pub struct SimulatedSource {
    serial_number: String,
    rng: StdRng,
}

impl SimulatedSource {
    /// Create a source for the given device serial number.
    pub fn new(serial_number: &str) -> Self {
        Self {
            serial_number: serial_number.to_string(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a source with a fixed RNG seed.
    pub fn with_seed(serial_number: &str, seed: u64) -> Self {
        Self {
            serial_number: serial_number.to_string(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn sample(&mut self, low: f64, high: f64) -> f64 {
        let value: f64 = self.rng.gen_range(low..=high);
        (value * 10.0).round() / 10.0
    }
}

impl ReadingSource for SimulatedSource {
    fn next_reading(&mut self) -> Reading {
        Reading {
            serial_number: self.serial_number.clone(),
            temperature: self.sample(15.0, 35.0),
            humidity: self.sample(40.0, 80.0),
            soil_temperature: self.sample(10.0, 30.0),
            soil_moisture: self.sample(20.0, 80.0),
            livestock_temperature: self.sample(37.0, 40.0),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_values_stay_in_range() {
        let mut source = SimulatedSource::with_seed("FW-TEST-1", 42);

        for _ in 0..100 {
            let reading = source.next_reading();
            assert!((15.0..=35.0).contains(&reading.temperature));
            assert!((40.0..=80.0).contains(&reading.humidity));
            assert!((10.0..=30.0).contains(&reading.soil_temperature));
            assert!((20.0..=80.0).contains(&reading.soil_moisture));
            assert!((37.0..=40.0).contains(&reading.livestock_temperature));
        }
    }

    #[test]
    fn test_simulated_reading_is_valid() {
        let mut source = SimulatedSource::with_seed("FW-TEST-2", 7);
        let reading = source.next_reading();

        assert_eq!(reading.serial_number, "FW-TEST-2");
        assert!(reading.validate().is_ok());
    }

    #[test]
    fn test_values_rounded_to_one_decimal() {
        let mut source = SimulatedSource::with_seed("FW-TEST-3", 11);
        let reading = source.next_reading();

        for (_, value) in reading.metrics() {
            let scaled = value * 10.0;
            assert!((scaled - scaled.round()).abs() < 1e-9);
        }
    }
}

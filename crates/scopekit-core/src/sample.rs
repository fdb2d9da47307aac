//! The `(time, voltage)` sample type.

use serde::{Deserialize, Serialize};

/// One acquisition point: time in seconds, voltage in volts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    /// Time in seconds.
    pub time: f64,
    /// Voltage in volts, as reported by the instrument (before probe scaling).
    pub voltage: f64,
}

impl Sample {
    /// Create a sample.
    pub const fn new(time: f64, voltage: f64) -> Self {
        Self { time, voltage }
    }
}

impl From<(f64, f64)> for Sample {
    fn from((time, voltage): (f64, f64)) -> Self {
        Self { time, voltage }
    }
}

/// A time-ordered sequence of samples for one channel.
pub type SampleStream = Vec<Sample>;

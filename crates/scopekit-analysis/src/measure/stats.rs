//! Running measurement statistics (Welford's online algorithm).

use serde::{Deserialize, Serialize};

/// Current, extrema, mean and population standard deviation of a value
/// stream.
///
/// Mean and variance are updated incrementally:
///
/// ```text
/// delta  = x − mean
/// mean  += delta / count
/// delta2 = x − mean
/// M2    += delta · delta2
/// stddev = sqrt(M2 / count)
/// ```
///
/// # Example
///
/// ```rust
/// use scopekit_analysis::MeasurementStatistics;
///
/// let mut stats = MeasurementStatistics::default();
/// for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
///     stats.update(x);
/// }
/// assert_eq!(stats.mean, 5.0);
/// assert_eq!(stats.std_dev, 2.0);
/// assert_eq!(stats.count, 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementStatistics {
    /// Most recent value
    pub current: f64,
    /// Smallest value seen
    pub minimum: f64,
    /// Largest value seen
    pub maximum: f64,
    /// Running mean
    pub mean: f64,
    /// Running population standard deviation
    pub std_dev: f64,
    /// Number of values seen
    pub count: u64,
    #[serde(skip)]
    m2: f64,
}

impl MeasurementStatistics {
    /// Fold in one value.
    pub fn update(&mut self, value: f64) {
        self.count += 1;
        self.current = value;

        if self.count == 1 {
            self.minimum = value;
            self.maximum = value;
            self.mean = value;
            self.std_dev = 0.0;
            self.m2 = 0.0;
            return;
        }

        self.minimum = self.minimum.min(value);
        self.maximum = self.maximum.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
        self.std_dev = (self.m2 / self.count as f64).sqrt();
    }

    /// Population variance.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.m2 / self.count as f64
    }

    /// Clear back to the empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

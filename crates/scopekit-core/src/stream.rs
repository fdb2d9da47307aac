//! Sample stream helpers: interpolation, level crossings and simple statistics.
//!
//! All functions take a time-sorted slice of [`Sample`]s. Empty input yields
//! `None` or an empty `Vec`, never a panic.

use crate::sample::Sample;

/// Time at which the straight line through `a` and `b` crosses `level`.
///
/// `t = t0 + (level - v0)·(t1 - t0)/(v1 - v0)`. A flat segment returns `t0`.
#[inline]
pub fn crossing_time(a: Sample, b: Sample, level: f64) -> f64 {
    let dv = b.voltage - a.voltage;
    if dv == 0.0 {
        return a.time;
    }
    a.time + (level - a.voltage) * (b.time - a.time) / dv
}

/// Index of the first sample whose time is `>= time` (lower bound).
///
/// Returns `stream.len()` when every sample is earlier than `time`.
#[inline]
pub fn lower_bound(stream: &[Sample], time: f64) -> usize {
    stream.partition_point(|s| s.time < time)
}

/// Linearly interpolated voltage at an arbitrary time.
///
/// Uses a binary search for the bracketing pair. Times before the first
/// sample return the first voltage; times after the last return the last.
///
/// # Example
/// ```rust
/// use scopekit_core::{Sample, stream::voltage_at};
///
/// let s = [Sample::new(0.0, 0.0), Sample::new(1.0, 2.0)];
/// assert_eq!(voltage_at(&s, 0.25), Some(0.5));
/// assert_eq!(voltage_at(&[], 0.25), None);
/// ```
pub fn voltage_at(stream: &[Sample], time: f64) -> Option<f64> {
    let last = stream.last()?;
    let idx = lower_bound(stream, time);

    if idx == 0 {
        return Some(stream[0].voltage);
    }
    if idx == stream.len() {
        return Some(last.voltage);
    }

    let a = stream[idx - 1];
    let b = stream[idx];
    let dt = b.time - a.time;
    if dt == 0.0 {
        return Some(b.voltage);
    }
    Some(a.voltage + (time - a.time) * (b.voltage - a.voltage) / dt)
}

/// Interpolated level at `time` compared against `threshold` (`true` = above).
///
/// An empty stream reads as low.
#[inline]
pub fn level_at(stream: &[Sample], time: f64, threshold: f64) -> bool {
    voltage_at(stream, time).is_some_and(|v| v > threshold)
}

/// Interpolated times where the stream goes from below `level` to `>= level`.
pub fn rising_crossings(stream: &[Sample], level: f64) -> Vec<f64> {
    stream
        .windows(2)
        .filter(|w| w[0].voltage < level && w[1].voltage >= level)
        .map(|w| crossing_time(w[0], w[1], level))
        .collect()
}

/// Interpolated times where the stream goes from above `level` to `<= level`.
pub fn falling_crossings(stream: &[Sample], level: f64) -> Vec<f64> {
    stream
        .windows(2)
        .filter(|w| w[0].voltage > level && w[1].voltage <= level)
        .map(|w| crossing_time(w[0], w[1], level))
        .collect()
}

/// Arithmetic mean of the voltages.
pub fn mean_voltage(stream: &[Sample]) -> Option<f64> {
    if stream.is_empty() {
        return None;
    }
    Some(stream.iter().map(|s| s.voltage).sum::<f64>() / stream.len() as f64)
}

/// `(min, max)` voltage.
pub fn voltage_range(stream: &[Sample]) -> Option<(f64, f64)> {
    let first = stream.first()?.voltage;
    Some(stream.iter().fold((first, first), |(lo, hi), s| {
        (lo.min(s.voltage), hi.max(s.voltage))
    }))
}

/// Mean spacing between consecutive sample times.
pub fn sample_interval(stream: &[Sample]) -> Option<f64> {
    if stream.len() < 2 {
        return None;
    }
    let span = stream[stream.len() - 1].time - stream[0].time;
    let dt = span / (stream.len() - 1) as f64;
    (dt > 0.0).then_some(dt)
}

/// Sample rate implied by [`sample_interval`].
pub fn sample_rate(stream: &[Sample]) -> Option<f64> {
    sample_interval(stream).map(|dt| 1.0 / dt)
}

/// Copy the voltages out of a stream.
pub fn voltages(stream: &[Sample]) -> Vec<f64> {
    stream.iter().map(|s| s.voltage).collect()
}

/// Build a uniformly spaced stream from voltages, starting at `t0`.
pub fn from_voltages(voltages: &[f64], sample_rate: f64, t0: f64) -> Vec<Sample> {
    let dt = 1.0 / sample_rate;
    voltages
        .iter()
        .enumerate()
        .map(|(i, &v)| Sample::new(t0 + i as f64 * dt, v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Vec<Sample> {
        (0..=10).map(|i| Sample::new(i as f64, i as f64)).collect()
    }

    #[test]
    fn voltage_at_interpolates_between_samples() {
        let s = ramp();
        assert!((voltage_at(&s, 3.25).unwrap() - 3.25).abs() < 1e-12);
        assert_eq!(voltage_at(&s, 4.0), Some(4.0));
    }

    #[test]
    fn voltage_at_clamps_outside_range() {
        let s = ramp();
        assert_eq!(voltage_at(&s, -5.0), Some(0.0));
        assert_eq!(voltage_at(&s, 50.0), Some(10.0));
    }

    #[test]
    fn single_sample_stream() {
        let s = [Sample::new(1.0, 3.3)];
        assert_eq!(voltage_at(&s, 0.0), Some(3.3));
        assert_eq!(voltage_at(&s, 2.0), Some(3.3));
        assert!(rising_crossings(&s, 1.0).is_empty());
    }

    #[test]
    fn crossing_time_is_linear() {
        let t = crossing_time(Sample::new(0.0, 0.0), Sample::new(2.0, 4.0), 1.0);
        assert!((t - 0.5).abs() < 1e-12);
        let flat = crossing_time(Sample::new(1.0, 2.0), Sample::new(2.0, 2.0), 2.0);
        assert_eq!(flat, 1.0);
    }

    #[test]
    fn crossings_on_square_wave() {
        let s: Vec<Sample> = (0..40)
            .map(|i| Sample::new(i as f64, if (i / 10) % 2 == 0 { 0.0 } else { 1.0 }))
            .collect();
        let rising = rising_crossings(&s, 0.5);
        let falling = falling_crossings(&s, 0.5);
        assert_eq!(rising.len(), 1);
        assert_eq!(falling.len(), 1);
        assert!((rising[0] - 9.5).abs() < 1e-12);
        assert!((falling[0] - 19.5).abs() < 1e-12);
    }

    #[test]
    fn summary_statistics() {
        let s = ramp();
        assert_eq!(mean_voltage(&s), Some(5.0));
        assert_eq!(voltage_range(&s), Some((0.0, 10.0)));
        assert_eq!(sample_interval(&s), Some(1.0));
        assert_eq!(mean_voltage(&[]), None);
        assert_eq!(voltage_range(&[]), None);
    }

    #[test]
    fn from_voltages_spacing() {
        let s = from_voltages(&[1.0, 2.0, 3.0], 1000.0, 0.5);
        assert_eq!(s.len(), 3);
        assert!((s[2].time - 0.502).abs() < 1e-12);
        assert_eq!(voltages(&s), vec![1.0, 2.0, 3.0]);
    }
}

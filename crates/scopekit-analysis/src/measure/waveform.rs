//! Per-channel waveform measurements.
//!
//! Each function reads one time-sorted sample stream and returns a scalar.
//! Voltage results are multiplied by `probe`; time results are not. Streams
//! too short to resolve a quantity yield 0.

use scopekit_core::Sample;
use scopekit_core::stream::{self, crossing_time, falling_crossings, rising_crossings};

use super::kind::MeasurementKind;

/// Histogram resolution used for [`vtop`] and [`vbase`].
pub const HISTOGRAM_BINS: usize = 100;

/// Minimum stream length for edge-timing and duty measurements.
const MIN_EDGE_SAMPLES: usize = 10;

/// Evaluate a single-channel measurement.
///
/// Phase and delay need two channels and read 0 here; see [`phase_delay`].
pub fn measure(kind: MeasurementKind, samples: &[Sample], probe: f64) -> f64 {
    match kind {
        MeasurementKind::Vpp => vpp(samples, probe),
        MeasurementKind::Vmax => vmax(samples, probe),
        MeasurementKind::Vmin => vmin(samples, probe),
        MeasurementKind::Vavg => vavg(samples, probe),
        MeasurementKind::Vrms => vrms(samples, probe),
        MeasurementKind::Vamplitude => vamplitude(samples, probe),
        MeasurementKind::Vtop => vtop(samples, probe),
        MeasurementKind::Vbase => vbase(samples, probe),
        MeasurementKind::Overshoot => overshoot(samples),
        MeasurementKind::Preshoot => preshoot(samples),
        MeasurementKind::Frequency => frequency(samples),
        MeasurementKind::Period => period(samples),
        MeasurementKind::RiseTime => rise_time(samples),
        MeasurementKind::FallTime => fall_time(samples),
        MeasurementKind::PositiveWidth => positive_width(samples),
        MeasurementKind::NegativeWidth => negative_width(samples),
        MeasurementKind::DutyCycle => duty_cycle(samples),
        MeasurementKind::PositiveDutyCycle => ratio_percent(positive_width(samples), period(samples)),
        MeasurementKind::NegativeDutyCycle => ratio_percent(negative_width(samples), period(samples)),
        MeasurementKind::Phase | MeasurementKind::Delay => 0.0,
    }
}

/// Peak-to-peak voltage.
pub fn vpp(samples: &[Sample], probe: f64) -> f64 {
    stream::voltage_range(samples).map_or(0.0, |(lo, hi)| (hi - lo) * probe)
}

/// Maximum voltage.
pub fn vmax(samples: &[Sample], probe: f64) -> f64 {
    stream::voltage_range(samples).map_or(0.0, |(_, hi)| hi * probe)
}

/// Minimum voltage.
pub fn vmin(samples: &[Sample], probe: f64) -> f64 {
    stream::voltage_range(samples).map_or(0.0, |(lo, _)| lo * probe)
}

/// Mean voltage.
pub fn vavg(samples: &[Sample], probe: f64) -> f64 {
    stream::mean_voltage(samples).map_or(0.0, |m| m * probe)
}

/// Root-mean-square voltage.
pub fn vrms(samples: &[Sample], probe: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|s| s.voltage * s.voltage).sum();
    (sum_sq / samples.len() as f64).sqrt() * probe
}

/// Mean of the samples in the fullest histogram bin of the upper or lower
/// half of the voltage range, in raw volts.
fn histogram_level(samples: &[Sample], upper: bool) -> Option<f64> {
    let (lo, hi) = stream::voltage_range(samples)?;
    let span = hi - lo;
    if span <= 0.0 {
        return Some(hi);
    }

    let mut counts = [0usize; HISTOGRAM_BINS];
    let mut sums = [0.0f64; HISTOGRAM_BINS];
    for s in samples {
        let bin = (((s.voltage - lo) / span) * HISTOGRAM_BINS as f64) as usize;
        let bin = bin.min(HISTOGRAM_BINS - 1);
        counts[bin] += 1;
        sums[bin] += s.voltage;
    }

    let half = HISTOGRAM_BINS / 2;
    let range = if upper { half..HISTOGRAM_BINS } else { 0..half };
    // Ties go to the outermost bin.
    let best = if upper {
        range.rev().max_by_key(|&b| counts[b])
    } else {
        range.max_by_key(|&b| counts[b])
    }?;

    if counts[best] == 0 {
        return Some(if upper { hi } else { lo });
    }
    Some(sums[best] / counts[best] as f64)
}

/// Most common level in the upper half of the range (falls back to the
/// maximum).
pub fn vtop(samples: &[Sample], probe: f64) -> f64 {
    histogram_level(samples, true).map_or(0.0, |v| v * probe)
}

/// Most common level in the lower half of the range (falls back to the
/// minimum).
pub fn vbase(samples: &[Sample], probe: f64) -> f64 {
    histogram_level(samples, false).map_or(0.0, |v| v * probe)
}

/// Top minus base.
pub fn vamplitude(samples: &[Sample], probe: f64) -> f64 {
    vtop(samples, probe) - vbase(samples, probe)
}

/// `(max − top) / amplitude · 100`.
pub fn overshoot(samples: &[Sample]) -> f64 {
    let amplitude = vamplitude(samples, 1.0);
    if amplitude <= 0.0 {
        return 0.0;
    }
    (vmax(samples, 1.0) - vtop(samples, 1.0)) / amplitude * 100.0
}

/// `(base − min) / amplitude · 100`.
pub fn preshoot(samples: &[Sample]) -> f64 {
    let amplitude = vamplitude(samples, 1.0);
    if amplitude <= 0.0 {
        return 0.0;
    }
    (vbase(samples, 1.0) - vmin(samples, 1.0)) / amplitude * 100.0
}

/// Interpolated rising crossings of the stream's own mean voltage.
pub fn mean_crossings(samples: &[Sample]) -> Vec<f64> {
    stream::mean_voltage(samples).map_or_else(Vec::new, |mean| rising_crossings(samples, mean))
}

/// Average spacing of rising mean-level crossings.
///
/// Needs at least three samples and two crossings.
pub fn period(samples: &[Sample]) -> f64 {
    if samples.len() < 3 {
        return 0.0;
    }
    let crossings = mean_crossings(samples);
    if crossings.len() < 2 {
        return 0.0;
    }
    (crossings[crossings.len() - 1] - crossings[0]) / (crossings.len() - 1) as f64
}

/// `1 / period`, or 0 when no period is found.
pub fn frequency(samples: &[Sample]) -> f64 {
    let p = period(samples);
    if p > 0.0 { 1.0 / p } else { 0.0 }
}

/// 10% and 90% levels of the min–max range.
fn transition_levels(samples: &[Sample]) -> Option<(f64, f64)> {
    let (lo, hi) = stream::voltage_range(samples)?;
    Some((lo + 0.1 * (hi - lo), lo + 0.9 * (hi - lo)))
}

/// Time from the first 10% rising crossing to the following 90% crossing.
pub fn rise_time(samples: &[Sample]) -> f64 {
    if samples.len() < MIN_EDGE_SAMPLES {
        return 0.0;
    }
    let Some((v10, v90)) = transition_levels(samples) else {
        return 0.0;
    };

    let mut start = None;
    for w in samples.windows(2) {
        let (a, b) = (w[0], w[1]);
        match start {
            None if a.voltage < v10 && b.voltage >= v10 => {
                start = Some(crossing_time(a, b, v10));
                // A single steep step can cross both levels at once.
                if b.voltage >= v90 {
                    return crossing_time(a, b, v90) - crossing_time(a, b, v10);
                }
            }
            Some(t0) if a.voltage < v90 && b.voltage >= v90 => {
                return crossing_time(a, b, v90) - t0;
            }
            _ => {}
        }
    }
    0.0
}

/// Time from the first 90% falling crossing to the following 10% crossing.
pub fn fall_time(samples: &[Sample]) -> f64 {
    if samples.len() < MIN_EDGE_SAMPLES {
        return 0.0;
    }
    let Some((v10, v90)) = transition_levels(samples) else {
        return 0.0;
    };

    let mut start = None;
    for w in samples.windows(2) {
        let (a, b) = (w[0], w[1]);
        match start {
            None if a.voltage > v90 && b.voltage <= v90 => {
                start = Some(crossing_time(a, b, v90));
                if b.voltage <= v10 {
                    return crossing_time(a, b, v10) - crossing_time(a, b, v90);
                }
            }
            Some(t0) if a.voltage > v10 && b.voltage <= v10 => {
                return crossing_time(a, b, v10) - t0;
            }
            _ => {}
        }
    }
    0.0
}

/// Midpoint of the min–max range.
fn mid_level(samples: &[Sample]) -> Option<f64> {
    stream::voltage_range(samples).map(|(lo, hi)| (lo + hi) / 2.0)
}

/// Mean spacing from each `from` crossing to the next `to` crossing.
fn mean_gap(from: &[f64], to: &[f64]) -> f64 {
    let gaps: Vec<f64> = from
        .iter()
        .filter_map(|&t0| {
            let i = to.partition_point(|&t| t <= t0);
            to.get(i).map(|&t1| t1 - t0)
        })
        .collect();
    if gaps.is_empty() {
        return 0.0;
    }
    gaps.iter().sum::<f64>() / gaps.len() as f64
}

/// Mean width of high pulses at the mid level.
pub fn positive_width(samples: &[Sample]) -> f64 {
    let Some(mid) = mid_level(samples) else {
        return 0.0;
    };
    mean_gap(&rising_crossings(samples, mid), &falling_crossings(samples, mid))
}

/// Mean width of low pulses at the mid level.
pub fn negative_width(samples: &[Sample]) -> f64 {
    let Some(mid) = mid_level(samples) else {
        return 0.0;
    };
    mean_gap(&falling_crossings(samples, mid), &rising_crossings(samples, mid))
}

/// Percentage of samples above the mean voltage.
pub fn duty_cycle(samples: &[Sample]) -> f64 {
    if samples.len() < MIN_EDGE_SAMPLES {
        return 0.0;
    }
    let Some(mean) = stream::mean_voltage(samples) else {
        return 0.0;
    };
    let high = samples.iter().filter(|s| s.voltage > mean).count();
    100.0 * high as f64 / samples.len() as f64
}

fn ratio_percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

/// Delay and phase of channel `b` relative to channel `a`.
///
/// Both channels need at least two rising crossings of their own mean
/// level, and `a` a positive period. Returns `(delay_seconds,
/// phase_degrees)` using the first crossing of each channel.
pub fn phase_delay(a: &[Sample], b: &[Sample]) -> Option<(f64, f64)> {
    let period_a = period(a);
    if period_a <= 0.0 {
        return None;
    }
    let crossings_a = mean_crossings(a);
    let crossings_b = mean_crossings(b);
    if crossings_a.len() < 2 || crossings_b.len() < 2 {
        return None;
    }

    let delay = crossings_b[0] - crossings_a[0];
    Some((delay, delay / period_a * 360.0))
}

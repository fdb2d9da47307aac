//! Peak search and distortion/noise metrics on single-sided spectra.
//!
//! Every function takes the `N/2`-bin spectrum returned by
//! [`SpectrumAnalyzer::compute`](crate::SpectrumAnalyzer::compute), so the bin
//! width is `sample_rate / (2 · len)`. THD, SFDR and SNR expect a dB-scaled
//! spectrum; [`find_peaks`] works in whatever scale it is given.

use scopekit_core::db_to_power;
use serde::{Deserialize, Serialize};

/// Bins excluded around the fundamental (and at DC) by [`calculate_sfdr`].
const SPUR_EXCLUSION: usize = 5;

/// Bins either side of the signal counted as signal power by [`calculate_snr`].
const SIGNAL_HALF_WIDTH: usize = 3;

/// A spectral peak refined by parabolic interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Interpolated frequency in Hz
    pub frequency: f64,
    /// Interpolated magnitude, in the spectrum's scale
    pub magnitude: f64,
    /// Index of the local-maximum bin
    pub bin: usize,
}

/// Width of one bin of an `N/2`-bin spectrum.
#[inline]
fn bin_width(spectrum: &[f64], sample_rate: f64) -> f64 {
    sample_rate / (spectrum.len() * 2) as f64
}

/// Bin nearest `frequency`, or `None` when it falls on DC or past the end.
fn nearest_bin(spectrum: &[f64], frequency: f64, sample_rate: f64) -> Option<usize> {
    let bin = (frequency / bin_width(spectrum, sample_rate) + 0.5) as i64;
    if bin <= 0 || bin >= spectrum.len() as i64 {
        return None;
    }
    Some(bin as usize)
}

/// Find local maxima above `threshold`, strongest first.
///
/// A bin qualifies when it is strictly greater than two neighbours on each
/// side, so the two outermost bins at either end are never peaks. Each peak
/// is refined with a parabola through the bin and its immediate neighbours:
///
/// ```text
/// δ = 0.5·(y₋₁ − y₊₁) / (y₋₁ − 2y₀ + y₊₁)
/// f = (bin + δ) · bin_width
/// m = y₀ − 0.25·(y₋₁ − y₊₁)·δ
/// ```
///
/// # Example
///
/// ```rust
/// use scopekit_analysis::find_peaks;
///
/// let mut spectrum = vec![0.0; 64];
/// spectrum[10] = 1.0;
/// let peaks = find_peaks(&spectrum, 128.0, 5, 0.5);
/// assert_eq!(peaks.len(), 1);
/// assert_eq!(peaks[0].bin, 10);
/// assert!((peaks[0].frequency - 10.0).abs() < 1e-12);
/// ```
pub fn find_peaks(spectrum: &[f64], sample_rate: f64, max_peaks: usize, threshold: f64) -> Vec<Peak> {
    let width = bin_width(spectrum, sample_rate);
    let mut peaks = Vec::new();

    for i in 2..spectrum.len().saturating_sub(2) {
        let y = spectrum[i];
        if y > threshold
            && y > spectrum[i - 1]
            && y > spectrum[i - 2]
            && y > spectrum[i + 1]
            && y > spectrum[i + 2]
        {
            let y0 = spectrum[i - 1];
            let y2 = spectrum[i + 1];
            // Strict local maximum keeps the curvature negative.
            let delta = 0.5 * (y0 - y2) / (y0 - 2.0 * y + y2);

            peaks.push(Peak {
                frequency: (i as f64 + delta) * width,
                magnitude: y - 0.25 * (y0 - y2) * delta,
                bin: i,
            });
        }
    }

    peaks.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    peaks.truncate(max_peaks);
    peaks
}

/// Total harmonic distortion in percent.
///
/// Sums the power at bins `h · fundamental_bin` for `h = 2..=harmonics`,
/// stopping at the end of the spectrum, and returns
/// `100 · sqrt(P_harmonics / P_fundamental)`. Returns 0 when the fundamental
/// lies on DC or beyond the spectrum.
pub fn calculate_thd(
    spectrum: &[f64],
    fundamental: f64,
    sample_rate: f64,
    harmonics: usize,
) -> f64 {
    let Some(fund_bin) = nearest_bin(spectrum, fundamental, sample_rate) else {
        return 0.0;
    };

    let fund_power = db_to_power(spectrum[fund_bin]);
    let harmonic_power: f64 = (2..=harmonics)
        .map(|h| fund_bin * h)
        .take_while(|&bin| bin < spectrum.len())
        .map(|bin| db_to_power(spectrum[bin]))
        .sum();

    100.0 * (harmonic_power / fund_power).sqrt()
}

/// Spurious-free dynamic range in dB.
///
/// The largest bin outside ±5 bins of the fundamental, and above bin 5,
/// is the spur. Returns `fundamental − spur`, or 0 when the fundamental is
/// out of range.
pub fn calculate_sfdr(spectrum: &[f64], fundamental: f64, sample_rate: f64) -> f64 {
    let Some(fund_bin) = nearest_bin(spectrum, fundamental, sample_rate) else {
        return 0.0;
    };

    let spur = spectrum
        .iter()
        .enumerate()
        .skip(SPUR_EXCLUSION)
        .filter(|(i, _)| i.abs_diff(fund_bin) > SPUR_EXCLUSION)
        .fold(scopekit_core::DB_FLOOR, |acc, (_, &v)| acc.max(v));

    spectrum[fund_bin] - spur
}

/// Signal-to-noise ratio in dB.
///
/// Signal power is the sum over ±3 bins around the signal. Noise power is
/// the sum over every other bin below `bandwidth` Hz, or over bins `5..` when
/// `bandwidth` is 0. Returns 0 when the signal is out of range or no noise
/// power is found.
pub fn calculate_snr(spectrum: &[f64], signal: f64, sample_rate: f64, bandwidth: f64) -> f64 {
    let Some(sig_bin) = nearest_bin(spectrum, signal, sample_rate) else {
        return 0.0;
    };

    let lo = sig_bin.saturating_sub(SIGNAL_HALF_WIDTH);
    let hi = (sig_bin + SIGNAL_HALF_WIDTH).min(spectrum.len() - 1);
    let signal_power: f64 = spectrum[lo..=hi].iter().map(|&v| db_to_power(v)).sum();

    let (start, end) = if bandwidth > 0.0 {
        let end = (bandwidth / bin_width(spectrum, sample_rate)) as usize;
        (0, end.min(spectrum.len()))
    } else {
        (SPUR_EXCLUSION, spectrum.len())
    };

    let noise_power: f64 = (start..end)
        .filter(|i| i.abs_diff(sig_bin) > SIGNAL_HALF_WIDTH)
        .map(|i| db_to_power(spectrum[i]))
        .sum();

    if noise_power == 0.0 {
        return 0.0;
    }
    10.0 * (signal_power / noise_power).log10()
}

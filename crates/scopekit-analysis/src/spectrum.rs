//! Spectrum analyzer: windowed FFT, exponential averaging and scale
//! conversion.
//!
//! [`SpectrumAnalyzer`] owns its configuration and the averaging
//! accumulator. Each [`compute`](SpectrumAnalyzer::compute) call turns one
//! FFT-size block of voltages into a [`Spectrum`] of `N/2` non-negative
//! frequency bins.

use rustfft::num_complex::Complex64;
use scopekit_core::{Sample, amplitude_to_db, next_power_of_two, stream};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;
use crate::fft;
use crate::metrics::{self, Peak};
use crate::window::WindowFunction;

/// Default FFT length.
pub const DEFAULT_FFT_SIZE: usize = 4096;

/// Smallest FFT length the analyzer accepts.
pub const MIN_FFT_SIZE: usize = 2;

/// Upper bound of the overlap fraction.
pub const MAX_OVERLAP: f64 = 0.99;

/// Vertical scale of the magnitude output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    /// Linear amplitude in volts
    Linear,
    /// `20·log10(V / reference)`
    #[default]
    Logarithmic,
    /// dB relative to 1 V (uses the reference level)
    Dbv,
    /// dBm scale (uses the reference level)
    Dbm,
}

impl ScaleType {
    /// All scales, in display order.
    pub const ALL: [ScaleType; 4] = [
        ScaleType::Linear,
        ScaleType::Logarithmic,
        ScaleType::Dbv,
        ScaleType::Dbm,
    ];

    /// Whether magnitudes are in decibels.
    pub fn is_db(self) -> bool {
        self != ScaleType::Linear
    }

    /// Unit label for axis captions.
    pub fn unit(self) -> &'static str {
        match self {
            ScaleType::Linear => "V",
            ScaleType::Logarithmic => "dB",
            ScaleType::Dbv => "dBV",
            ScaleType::Dbm => "dBm",
        }
    }

    /// Lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            ScaleType::Linear => "linear",
            ScaleType::Logarithmic => "logarithmic",
            ScaleType::Dbv => "dbv",
            ScaleType::Dbm => "dbm",
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScaleType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" | "lin" => Ok(ScaleType::Linear),
            "logarithmic" | "log" | "db" => Ok(ScaleType::Logarithmic),
            "dbv" => Ok(ScaleType::Dbv),
            "dbm" => Ok(ScaleType::Dbm),
            _ => Err(ParseEnumError::new("scale", s)),
        }
    }
}

/// Result of one spectrum computation.
///
/// `magnitudes` and `frequencies` have equal length `fft_size / 2`. Both are
/// empty when the input was too short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    /// Magnitude per bin, in `scale` units
    pub magnitudes: Vec<f64>,
    /// Bin centre frequencies in Hz
    pub frequencies: Vec<f64>,
    /// Scale the magnitudes are expressed in
    pub scale: ScaleType,
    /// Sample rate of the source block
    pub sample_rate: f64,
    /// FFT length used
    pub fft_size: usize,
}

impl Spectrum {
    fn empty(scale: ScaleType, sample_rate: f64, fft_size: usize) -> Self {
        Self {
            magnitudes: Vec::new(),
            frequencies: Vec::new(),
            scale,
            sample_rate,
            fft_size,
        }
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    /// True when the computation produced no bins.
    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Frequency spacing between bins in Hz.
    pub fn bin_width(&self) -> f64 {
        if self.fft_size == 0 {
            return 0.0;
        }
        self.sample_rate / self.fft_size as f64
    }

    /// Local maxima above `threshold`; see [`metrics::find_peaks`].
    pub fn find_peaks(&self, max_peaks: usize, threshold: f64) -> Vec<Peak> {
        metrics::find_peaks(&self.magnitudes, self.sample_rate, max_peaks, threshold)
    }

    /// THD in percent; see [`metrics::calculate_thd`].
    pub fn thd(&self, fundamental: f64, harmonics: usize) -> f64 {
        metrics::calculate_thd(&self.magnitudes, fundamental, self.sample_rate, harmonics)
    }

    /// SFDR in dB; see [`metrics::calculate_sfdr`].
    pub fn sfdr(&self, fundamental: f64) -> f64 {
        metrics::calculate_sfdr(&self.magnitudes, fundamental, self.sample_rate)
    }

    /// SNR in dB; see [`metrics::calculate_snr`].
    pub fn snr(&self, signal: f64, bandwidth: f64) -> f64 {
        metrics::calculate_snr(&self.magnitudes, signal, self.sample_rate, bandwidth)
    }
}

/// Exponential moving average of magnitude frames.
#[derive(Debug, Clone, Default)]
struct Averager {
    buffer: Vec<f64>,
    counter: usize,
}

impl Averager {
    fn reset(&mut self) {
        self.buffer.clear();
        self.counter = 0;
    }

    /// Blend `frame` in with weight `1/count` and return the running average.
    fn blend(&mut self, frame: &[f64], count: usize) -> &[f64] {
        if self.buffer.len() != frame.len() {
            self.buffer = frame.to_vec();
            self.counter = 1;
        } else {
            let alpha = 1.0 / count as f64;
            for (avg, &m) in self.buffer.iter_mut().zip(frame) {
                *avg = (1.0 - alpha) * *avg + alpha * m;
            }
            self.counter = (self.counter + 1).min(count);
        }
        &self.buffer
    }
}

/// Windowed-FFT spectrum analyzer.
///
/// # Example
///
/// ```rust
/// use scopekit_analysis::{ScaleType, SpectrumAnalyzer, WindowFunction};
///
/// let mut analyzer = SpectrumAnalyzer::new();
/// analyzer.set_fft_size(1024);
/// analyzer.set_window(WindowFunction::Rectangle);
/// analyzer.set_scale(ScaleType::Linear);
///
/// let fs = 1024.0;
/// let signal: Vec<f64> = (0..1024)
///     .map(|i| (2.0 * std::f64::consts::PI * 64.0 * i as f64 / fs).sin())
///     .collect();
///
/// let spectrum = analyzer.compute(&signal, fs);
/// assert_eq!(spectrum.len(), 512);
/// assert!((spectrum.magnitudes[64] - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct SpectrumAnalyzer {
    window: WindowFunction,
    scale: ScaleType,
    fft_size: usize,
    overlap: f64,
    averaging: usize,
    reference_level: f64,
    amplitude_correction: bool,
    averager: Averager,
    last: Option<Spectrum>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumAnalyzer {
    /// Hanning window, logarithmic scale, 4096-point FFT, 50% overlap,
    /// no averaging, 1 V reference.
    pub fn new() -> Self {
        Self {
            window: WindowFunction::Hanning,
            scale: ScaleType::Logarithmic,
            fft_size: DEFAULT_FFT_SIZE,
            overlap: 0.5,
            averaging: 1,
            reference_level: 1.0,
            amplitude_correction: true,
            averager: Averager::default(),
            last: None,
        }
    }

    /// Window function.
    pub fn window(&self) -> WindowFunction {
        self.window
    }

    /// Set the window function.
    pub fn set_window(&mut self, window: WindowFunction) {
        if self.window != window {
            tracing::debug!(from = %self.window, to = %window, "window changed");
            self.window = window;
        }
    }

    /// Output scale.
    pub fn scale(&self) -> ScaleType {
        self.scale
    }

    /// Set the output scale.
    pub fn set_scale(&mut self, scale: ScaleType) {
        self.scale = scale;
    }

    /// FFT length (always a power of two).
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Set the FFT length, rounded up to the next power of two (minimum 2).
    ///
    /// A change of size clears the averaging accumulator.
    pub fn set_fft_size(&mut self, size: usize) {
        let size = next_power_of_two(size.max(MIN_FFT_SIZE));
        if size != self.fft_size {
            tracing::debug!(from = self.fft_size, to = size, "FFT size changed, averaging reset");
            self.fft_size = size;
            self.averager.reset();
        }
    }

    /// Overlap fraction between successive blocks.
    pub fn overlap(&self) -> f64 {
        self.overlap
    }

    /// Set the overlap fraction, clamped to `[0, 0.99]`.
    ///
    /// Stored for the caller's framing; [`compute`](Self::compute) processes
    /// one block per call regardless.
    pub fn set_overlap(&mut self, overlap: f64) {
        self.overlap = if overlap.is_nan() {
            0.0
        } else {
            overlap.clamp(0.0, MAX_OVERLAP)
        };
    }

    /// Number of frames averaged (1 = off).
    pub fn averaging(&self) -> usize {
        self.averaging
    }

    /// Set the averaging count (floored at 1). Always clears the accumulator.
    pub fn set_averaging(&mut self, count: usize) {
        self.averaging = count.max(1);
        self.averager.reset();
    }

    /// Frames blended into the accumulator so far, saturating at the
    /// averaging count.
    pub fn averaged_frames(&self) -> usize {
        self.averager.counter
    }

    /// Reference level in volts for dB scales.
    pub fn reference_level(&self) -> f64 {
        self.reference_level
    }

    /// Set the dB reference level. Non-positive values are ignored.
    pub fn set_reference_level(&mut self, level: f64) {
        if level > 0.0 && level.is_finite() {
            self.reference_level = level;
        } else {
            tracing::debug!(level, "ignoring non-positive reference level");
        }
    }

    /// Whether magnitudes are divided by the window's coherent gain.
    pub fn amplitude_correction(&self) -> bool {
        self.amplitude_correction
    }

    /// Enable or disable coherent-gain correction.
    ///
    /// With correction on, a sinusoid of amplitude `A` reads `A` under every
    /// window; with it off, tapered windows attenuate the reading by their
    /// coherent gain (about 0.5 for Hanning).
    pub fn set_amplitude_correction(&mut self, enabled: bool) {
        self.amplitude_correction = enabled;
    }

    /// Window coefficients for the current window and FFT size.
    pub fn window_coefficients(&self) -> Vec<f64> {
        self.window.coefficients(self.fft_size)
    }

    /// Frequency of each returned bin: `f[i] = i · sample_rate / N`.
    pub fn frequency_axis(&self, sample_rate: f64) -> Vec<f64> {
        frequency_axis(self.fft_size, sample_rate)
    }

    /// Windowed complex transform of the first FFT-size samples.
    ///
    /// Returns an empty vector when fewer than `fft_size` samples are given.
    pub fn transform(&self, samples: &[f64]) -> Vec<Complex64> {
        if samples.len() < self.fft_size {
            return Vec::new();
        }
        let mut block = samples[..self.fft_size].to_vec();
        self.window.apply(&mut block);
        fft::forward_real(&block)
    }

    /// Compute the spectrum of the first FFT-size samples.
    ///
    /// Returns an empty [`Spectrum`] when fewer than `fft_size` samples are
    /// given. With averaging above 1 the result is the running exponential
    /// average of every frame since the last reset.
    pub fn compute(&mut self, samples: &[f64], sample_rate: f64) -> Spectrum {
        if samples.len() < self.fft_size {
            tracing::debug!(
                samples = samples.len(),
                fft_size = self.fft_size,
                "insufficient samples for spectrum"
            );
            return Spectrum::empty(self.scale, sample_rate, self.fft_size);
        }

        let transformed = self.transform(samples);
        let mut magnitude = fft::magnitude_spectrum(&transformed);

        if self.amplitude_correction {
            let gain = self.window.coherent_gain(self.fft_size);
            if gain > 0.0 {
                magnitude.iter_mut().for_each(|m| *m /= gain);
            }
        }

        if self.averaging > 1 {
            magnitude = self.averager.blend(&magnitude, self.averaging).to_vec();
        }

        let half = self.fft_size / 2;
        magnitude.truncate(half);

        if self.scale.is_db() {
            let reference = self.reference_level;
            for m in &mut magnitude {
                *m = amplitude_to_db(*m / reference);
            }
        }

        let spectrum = Spectrum {
            magnitudes: magnitude,
            frequencies: self.frequency_axis(sample_rate),
            scale: self.scale,
            sample_rate,
            fft_size: self.fft_size,
        };
        tracing::trace!(bins = spectrum.len(), sample_rate, "spectrum computed");
        self.last = Some(spectrum.clone());
        spectrum
    }

    /// Compute the spectrum of a sample stream, deriving the sample rate from
    /// its time axis.
    pub fn compute_stream(&mut self, samples: &[Sample]) -> Spectrum {
        let Some(sample_rate) = stream::sample_rate(samples) else {
            tracing::debug!(samples = samples.len(), "cannot derive sample rate");
            return Spectrum::empty(self.scale, 0.0, self.fft_size);
        };
        self.compute(&stream::voltages(samples), sample_rate)
    }

    /// Most recent non-empty spectrum.
    pub fn last_spectrum(&self) -> Option<&Spectrum> {
        self.last.as_ref()
    }

    /// Clear the averaging accumulator.
    pub fn reset_averaging(&mut self) {
        self.averager.reset();
    }
}

/// Frequencies of the `fft_size / 2` non-negative bins.
pub fn frequency_axis(fft_size: usize, sample_rate: f64) -> Vec<f64> {
    if fft_size == 0 {
        return Vec::new();
    }
    let width = sample_rate / fft_size as f64;
    (0..fft_size / 2).map(|i| i as f64 * width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(n: usize, freq: f64, fs: f64, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn fft_size_rounds_up() {
        let mut a = SpectrumAnalyzer::new();
        a.set_fft_size(1000);
        assert_eq!(a.fft_size(), 1024);
        a.set_fft_size(0);
        assert_eq!(a.fft_size(), MIN_FFT_SIZE);
        a.set_fft_size(4096);
        assert_eq!(a.fft_size(), 4096);
    }

    #[test]
    fn overlap_and_averaging_are_clamped() {
        let mut a = SpectrumAnalyzer::new();
        a.set_overlap(1.5);
        assert_eq!(a.overlap(), MAX_OVERLAP);
        a.set_overlap(-0.2);
        assert_eq!(a.overlap(), 0.0);
        a.set_averaging(0);
        assert_eq!(a.averaging(), 1);
        a.set_reference_level(-1.0);
        assert_eq!(a.reference_level(), 1.0);
    }

    #[test]
    fn insufficient_samples_yield_empty_spectrum() {
        let mut a = SpectrumAnalyzer::new();
        let s = a.compute(&[0.0; 100], 1000.0);
        assert!(s.is_empty());
        assert!(s.frequencies.is_empty());
        assert!(a.last_spectrum().is_none());
        assert!(a.transform(&[0.0; 100]).is_empty());
    }

    #[test]
    fn output_has_half_the_bins() {
        let mut a = SpectrumAnalyzer::new();
        a.set_fft_size(256);
        let s = a.compute(&sine(300, 10.0, 256.0, 1.0), 256.0);
        assert_eq!(s.len(), 128);
        assert_eq!(s.frequencies.len(), 128);
        assert_eq!(s.frequencies[1], 1.0);
        assert_eq!(s.bin_width(), 1.0);
        assert!(a.last_spectrum().is_some());
    }

    #[test]
    fn log_scale_uses_reference_and_floor() {
        let mut a = SpectrumAnalyzer::new();
        a.set_fft_size(256);
        a.set_window(WindowFunction::Rectangle);
        a.set_reference_level(0.5);
        let s = a.compute(&sine(256, 32.0, 256.0, 1.0), 256.0);
        // 1 V against 0.5 V reference
        assert!((s.magnitudes[32] - 20.0 * 2.0_f64.log10()).abs() < 1e-6);

        let silent = a.compute(&[0.0; 256], 256.0);
        assert!(silent.magnitudes.iter().all(|&m| m == -200.0));
    }

    #[test]
    fn hanning_with_correction_reads_amplitude() {
        let mut a = SpectrumAnalyzer::new();
        a.set_fft_size(1024);
        a.set_scale(ScaleType::Linear);
        let s = a.compute(&sine(1024, 100.0, 1024.0, 2.0), 1024.0);
        assert!((s.magnitudes[100] - 2.0).abs() < 0.01);

        a.set_amplitude_correction(false);
        let s = a.compute(&sine(1024, 100.0, 1024.0, 2.0), 1024.0);
        assert!((s.magnitudes[100] - 1.0).abs() < 0.01);
    }

    #[test]
    fn correction_is_on_by_default_and_neutral_for_rectangle() {
        let mut a = SpectrumAnalyzer::new();
        assert!(a.amplitude_correction());
        a.set_fft_size(1024);
        a.set_scale(ScaleType::Linear);
        a.set_window(WindowFunction::Rectangle);
        let input = sine(1024, 100.0, 1024.0, 1.5);
        let corrected = a.compute(&input, 1024.0);

        a.set_amplitude_correction(false);
        let bare = a.compute(&input, 1024.0);
        assert!((bare.magnitudes[100] - 1.5).abs() < 1e-9);
        assert!((corrected.magnitudes[100] - bare.magnitudes[100]).abs() < 1e-9);
    }

    #[test]
    fn averaging_blends_frames() {
        let mut a = SpectrumAnalyzer::new();
        a.set_fft_size(64);
        a.set_window(WindowFunction::Rectangle);
        a.set_scale(ScaleType::Linear);
        a.set_averaging(4);

        let loud = vec![1.0; 64];
        let quiet = vec![0.0; 64];

        let first = a.compute(&loud, 64.0);
        assert!((first.magnitudes[0] - 1.0).abs() < 1e-12);
        assert_eq!(a.averaged_frames(), 1);

        // 0.75·1 + 0.25·0
        let second = a.compute(&quiet, 64.0);
        assert!((second.magnitudes[0] - 0.75).abs() < 1e-12);

        for _ in 0..10 {
            a.compute(&quiet, 64.0);
        }
        assert_eq!(a.averaged_frames(), 4);

        a.set_fft_size(128);
        assert_eq!(a.averaged_frames(), 0);
    }

    #[test]
    fn compute_stream_derives_sample_rate() {
        let fs = 2048.0;
        let samples = stream::from_voltages(&sine(512, 256.0, fs, 1.0), fs, 0.0);
        let mut a = SpectrumAnalyzer::new();
        a.set_fft_size(512);
        a.set_scale(ScaleType::Linear);
        let s = a.compute_stream(&samples);
        assert!((s.sample_rate - fs).abs() < 1e-6);
        let peak = s.find_peaks(1, 0.1);
        assert!((peak[0].frequency - 256.0).abs() < s.bin_width());

        assert!(a.compute_stream(&[]).is_empty());
    }

    #[test]
    fn scale_parse() {
        for scale in ScaleType::ALL {
            assert_eq!(scale.as_str().parse::<ScaleType>().unwrap(), scale);
        }
        assert!("decibel".parse::<ScaleType>().is_err());
    }
}

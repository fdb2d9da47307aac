//! Scopekit Analysis - Spectrum, protocol and measurement engines
//!
//! This crate turns sample streams into the derived artifacts an oscilloscope
//! front end displays:
//!
//! ## Spectrum Analyzer
//!
//! - [`fft`] - Radix-2 FFT and magnitude/phase/power spectra
//! - [`window`] - Window functions (Rectangle, Hanning, Hamming, Blackman, FlatTop, Kaiser)
//! - [`spectrum`] - [`SpectrumAnalyzer`] with scaling and exponential averaging
//! - [`metrics`] - Peak search, THD, SFDR and SNR
//!
//! ## Serial Protocol Decoder
//!
//! - [`protocol`] - [`ProtocolDecoder`] for UART, SPI and I2C captures
//!
//! ## Measurement Engine
//!
//! - [`measure`] - [`MeasurementEngine`] with Welford statistics
//!
//! ## Test Signals
//!
//! - [`signal`] - Sines, squares, noise and rendered bus captures
//!
//! All engines are synchronous and never fail: insufficient input yields an
//! empty result or an invalid flag, and out-of-range settings are corrected
//! silently.
//!
//! ## Example
//!
//! ```rust
//! use scopekit_analysis::{ScaleType, SpectrumAnalyzer, WindowFunction, signal};
//!
//! let fs = 1_000_000.0;
//! let tone = signal::sine(4096, fs, 1000.0, 1.0, 0.0, 0.0);
//!
//! let mut analyzer = SpectrumAnalyzer::new();
//! analyzer.set_window(WindowFunction::Hanning);
//! analyzer.set_scale(ScaleType::Logarithmic);
//! let spectrum = analyzer.compute(&tone, fs);
//!
//! let peaks = spectrum.find_peaks(1, -60.0);
//! assert_eq!(peaks.len(), 1);
//! assert!((peaks[0].frequency - 1000.0).abs() < spectrum.bin_width());
//! ```

pub mod fft;
pub mod measure;
pub mod metrics;
pub mod protocol;
pub mod signal;
pub mod spectrum;
pub mod window;

use thiserror::Error;

pub use measure::{
    Measurement, MeasurementEngine, MeasurementId, MeasurementKind, MeasurementStatistics,
    format_value,
};
pub use metrics::{Peak, calculate_sfdr, calculate_snr, calculate_thd, find_peaks};
pub use protocol::{
    DecodedFrame, Edge, EdgeDirection, FrameError, FrameKind, I2cConfig, Parity, Protocol,
    ProtocolDecoder, SpiConfig, UartConfig, estimate_bit_period, find_edges,
};
pub use spectrum::{ScaleType, Spectrum, SpectrumAnalyzer, frequency_axis};
pub use window::{WindowFunction, window_coefficients};

/// Unrecognized name for one of the crate's enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what} '{value}'")]
pub struct ParseEnumError {
    /// What was being parsed, e.g. `"window function"`
    pub what: &'static str,
    /// The rejected input
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

//! Window functions applied before the FFT.
//!
//! All tapered windows use the symmetric form with an `N-1` denominator, so
//! `w[i] == w[N-1-i]` holds for every window.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;

/// Shape parameter of the Kaiser window.
pub const KAISER_BETA: f64 = 5.0;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    /// Rectangular (no windowing)
    Rectangle,
    /// Hanning window (raised cosine), general purpose
    #[default]
    Hanning,
    /// Hamming window
    Hamming,
    /// Blackman window (better sidelobe suppression)
    Blackman,
    /// Flat-top window for accurate amplitude readings
    #[serde(rename = "flattop")]
    FlatTop,
    /// Kaiser window with β = 5
    Kaiser,
}

impl WindowFunction {
    /// All window functions, in display order.
    pub const ALL: [WindowFunction; 6] = [
        WindowFunction::Rectangle,
        WindowFunction::Hanning,
        WindowFunction::Hamming,
        WindowFunction::Blackman,
        WindowFunction::FlatTop,
        WindowFunction::Kaiser,
    ];

    /// Get window coefficients
    pub fn coefficients(self, size: usize) -> Vec<f64> {
        if size <= 1 {
            return vec![1.0; size];
        }

        let m = (size - 1) as f64;
        match self {
            WindowFunction::Rectangle => vec![1.0; size],
            WindowFunction::Hanning => (0..size)
                .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / m).cos()))
                .collect(),
            WindowFunction::Hamming => (0..size)
                .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / m).cos())
                .collect(),
            WindowFunction::Blackman => (0..size)
                .map(|i| {
                    let x = 2.0 * PI * i as f64 / m;
                    0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
                })
                .collect(),
            WindowFunction::FlatTop => (0..size)
                .map(|i| {
                    let x = 2.0 * PI * i as f64 / m;
                    0.21557895 - 0.41663158 * x.cos() + 0.277263158 * (2.0 * x).cos()
                        - 0.083578947 * (3.0 * x).cos()
                        + 0.006947368 * (4.0 * x).cos()
                })
                .collect(),
            WindowFunction::Kaiser => {
                let alpha = m / 2.0;
                let denom = bessel_i0(KAISER_BETA);
                (0..size)
                    .map(|i| {
                        let r = (i as f64 - alpha) / alpha;
                        let arg = KAISER_BETA * (1.0 - r * r).max(0.0).sqrt();
                        bessel_i0(arg) / denom
                    })
                    .collect()
            }
        }
    }

    /// Apply window to a buffer
    pub fn apply(self, buffer: &mut [f64]) {
        if self == WindowFunction::Rectangle {
            return;
        }
        let coeffs = self.coefficients(buffer.len());
        for (sample, w) in buffer.iter_mut().zip(coeffs) {
            *sample *= w;
        }
    }

    /// Mean of the coefficients.
    ///
    /// A sinusoid of amplitude `A` windowed by `w` peaks at `A · coherent_gain`
    /// in a `2/N`-scaled spectrum.
    pub fn coherent_gain(self, size: usize) -> f64 {
        if size == 0 {
            return 1.0;
        }
        self.coefficients(size).iter().sum::<f64>() / size as f64
    }

    /// Lowercase identifier used in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            WindowFunction::Rectangle => "rectangle",
            WindowFunction::Hanning => "hanning",
            WindowFunction::Hamming => "hamming",
            WindowFunction::Blackman => "blackman",
            WindowFunction::FlatTop => "flattop",
            WindowFunction::Kaiser => "kaiser",
        }
    }
}

impl fmt::Display for WindowFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowFunction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rectangle" | "rectangular" | "rect" | "none" => Ok(WindowFunction::Rectangle),
            "hanning" | "hann" => Ok(WindowFunction::Hanning),
            "hamming" => Ok(WindowFunction::Hamming),
            "blackman" => Ok(WindowFunction::Blackman),
            "flattop" | "flat-top" | "flat_top" => Ok(WindowFunction::FlatTop),
            "kaiser" => Ok(WindowFunction::Kaiser),
            _ => Err(ParseEnumError::new("window function", s)),
        }
    }
}

/// Coefficients of `window` for a block of `size` samples.
///
/// Same as [`WindowFunction::coefficients`].
pub fn window_coefficients(window: WindowFunction, size: usize) -> Vec<f64> {
    window.coefficients(size)
}

/// Zeroth-order modified Bessel function of the first kind.
///
/// Truncated power series `Σ ((x/2)^k / k!)²`; 25 terms converge to double
/// precision for the arguments a β = 5 Kaiser window produces.
pub fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut term = 1.0;
    for k in 1..=25 {
        let half = x / (2.0 * k as f64);
        term *= half * half;
        sum += term;
    }
    sum
}

//! Iterative radix-2 FFT and spectrum conversions.
//!
//! The transform is an in-place Cooley-Tukey decimation-in-time FFT: a
//! bit-reversal permutation followed by `log2(N)` butterfly passes with
//! twiddle factors `e^{-2πi/len}`. Inputs whose length is not a power of two
//! are zero-padded up to the next one.

use rustfft::num_complex::Complex64;
use scopekit_core::next_power_of_two;
use std::f64::consts::PI;

/// In-place forward FFT.
///
/// # Panics
///
/// Panics if `data.len()` is not a power of two. Use [`forward_real`] or
/// [`forward`] to get zero-padding.
pub fn fft_in_place(data: &mut [Complex64]) {
    let n = data.len();
    assert!(n.is_power_of_two(), "FFT length {n} is not a power of two");
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation
    let mut j = 0usize;
    for i in 0..n - 1 {
        if i < j {
            data.swap(i, j);
        }
        let mut k = n / 2;
        while k <= j {
            j -= k;
            k /= 2;
        }
        j += k;
    }

    // Butterfly passes
    let mut len = 2;
    while len <= n {
        let angle = -2.0 * PI / len as f64;
        let wlen = Complex64::new(angle.cos(), angle.sin());
        let half = len / 2;

        for start in (0..n).step_by(len) {
            let mut w = Complex64::new(1.0, 0.0);
            for k in 0..half {
                let u = data[start + k];
                let v = data[start + k + half] * w;
                data[start + k] = u + v;
                data[start + k + half] = u - v;
                w *= wlen;
            }
        }
        len *= 2;
    }
}

/// Forward FFT of complex input, zero-padded to the next power of two.
pub fn forward(input: &[Complex64]) -> Vec<Complex64> {
    let n = next_power_of_two(input.len());
    let mut data = Vec::with_capacity(n);
    data.extend_from_slice(input);
    data.resize(n, Complex64::new(0.0, 0.0));
    fft_in_place(&mut data);
    data
}

/// Forward FFT of real input, zero-padded to the next power of two.
///
/// Returns the full `N`-bin complex spectrum.
pub fn forward_real(input: &[f64]) -> Vec<Complex64> {
    let n = next_power_of_two(input.len());
    let mut data: Vec<Complex64> = input.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    data.resize(n, Complex64::new(0.0, 0.0));
    fft_in_place(&mut data);
    data
}

/// Single-sided amplitude spectrum: `|X[k]| · 2/N`.
///
/// DC and (for even `N`) the Nyquist bin are not mirrored and are halved, so
/// a sinusoid of amplitude `A` reads `A` and a DC offset `d` reads `d`.
pub fn magnitude_spectrum(spectrum: &[Complex64]) -> Vec<f64> {
    let n = spectrum.len();
    if n == 0 {
        return Vec::new();
    }

    let scale = 2.0 / n as f64;
    let mut magnitude: Vec<f64> = spectrum.iter().map(|c| c.norm() * scale).collect();

    magnitude[0] /= 2.0;
    if n % 2 == 0 && n > 1 {
        magnitude[n / 2] /= 2.0;
    }
    magnitude
}

/// Phase of each bin in degrees.
pub fn phase_spectrum(spectrum: &[Complex64]) -> Vec<f64> {
    spectrum.iter().map(|c| c.arg().to_degrees()).collect()
}

/// Power of each bin: `|X[k]|² / N²`.
pub fn power_spectrum(spectrum: &[Complex64]) -> Vec<f64> {
    let n = spectrum.len() as f64;
    let scale = 1.0 / (n * n);
    spectrum.iter().map(|c| c.norm_sqr() * scale).collect()
}

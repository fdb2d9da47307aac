//! Level conversion helpers.
//!
//! Spectrum magnitudes travel as linear amplitudes until the last step of a
//! computation, where they are converted to decibels. Power-domain metrics
//! (THD, SNR) go back from dB to linear power with [`db_to_power`].

/// Floor returned by [`amplitude_to_db`] for non-positive input.
///
/// Keeps `-inf` out of spectra so downstream comparisons stay well defined.
pub const DB_FLOOR: f64 = -200.0;

/// Convert a linear amplitude ratio to decibels (`20·log10`).
///
/// Values `<= 0` map to [`DB_FLOOR`].
///
/// # Example
/// ```rust
/// use scopekit_core::amplitude_to_db;
///
/// assert!((amplitude_to_db(1.0)).abs() < 1e-12);
/// assert!((amplitude_to_db(0.1) + 20.0).abs() < 1e-9);
/// assert_eq!(amplitude_to_db(0.0), -200.0);
/// ```
#[inline]
pub fn amplitude_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        DB_FLOOR
    } else {
        20.0 * linear.log10()
    }
}

/// Convert decibels to linear power (`10^(dB/10)`).
#[inline]
pub fn db_to_power(db: f64) -> f64 {
    10.0_f64.powf(db / 10.0)
}

/// Convert linear power to decibels (`10·log10`), floored at [`DB_FLOOR`].
#[inline]
pub fn power_to_db(power: f64) -> f64 {
    if power <= 0.0 {
        DB_FLOOR
    } else {
        10.0 * power.log10()
    }
}

/// Smallest power of two `>= n`. Zero rounds up to 1.
#[inline]
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

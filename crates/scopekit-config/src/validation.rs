//! Configuration validation.
//!
//! The engines silently correct out-of-range settings (FFT size rounded to a
//! power of two, overlap clamped, averaging floored at 1). Validation reports
//! those corrections up front as [`ValidationNote`]s so a user can fix the
//! file. Only settings the engines cannot repair are hard errors.

use std::fmt;
use thiserror::Error;

use crate::scope::ScopeConfig;
use scopekit_analysis::protocol::{MAX_UART_DATA_BITS, MIN_UART_DATA_BITS};
use scopekit_analysis::spectrum::MAX_OVERLAP;

/// Settings that cannot be applied.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Phase or delay measurement without a second channel.
    #[error("'{kind}' measurement on '{channel}' needs a secondary channel")]
    MissingSecondary {
        /// Measurement identifier.
        kind: String,
        /// Primary channel name.
        channel: String,
    },

    /// Measurement without a channel name.
    #[error("'{kind}' measurement has an empty channel name")]
    EmptyChannel {
        /// Measurement identifier.
        kind: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A setting the engines will correct when applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationNote {
    /// Dotted path of the setting, e.g. `spectrum.fft_size`.
    pub field: String,
    /// What will happen to it.
    pub message: String,
}

impl ValidationNote {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration.
///
/// Returns the correction notes, or the hard errors when any measurement is
/// unusable.
pub fn validate_config(config: &ScopeConfig) -> ValidationResult<Vec<ValidationNote>> {
    let mut notes = Vec::new();

    let spectrum = &config.spectrum;
    if spectrum.fft_size < 2 || !spectrum.fft_size.is_power_of_two() {
        let applied = spectrum.fft_size.max(2).next_power_of_two();
        notes.push(ValidationNote::new(
            "spectrum.fft_size",
            format!("{} is not a power of two, using {applied}", spectrum.fft_size),
        ));
    }
    if !(0.0..=MAX_OVERLAP).contains(&spectrum.overlap) {
        notes.push(ValidationNote::new(
            "spectrum.overlap",
            format!("{} is outside [0, {MAX_OVERLAP}] and will be clamped", spectrum.overlap),
        ));
    }
    if spectrum.averaging == 0 {
        notes.push(ValidationNote::new("spectrum.averaging", "0 is raised to 1"));
    }
    if !(spectrum.reference_level > 0.0 && spectrum.reference_level.is_finite()) {
        notes.push(ValidationNote::new(
            "spectrum.reference_level",
            format!("{} is not positive, keeping 1.0", spectrum.reference_level),
        ));
    }

    let decoder = &config.decoder;
    if decoder.high_threshold < decoder.low_threshold {
        notes.push(ValidationNote::new(
            "decoder.high_threshold",
            format!(
                "{} is below low_threshold {}; thresholds are inverted",
                decoder.high_threshold, decoder.low_threshold
            ),
        ));
    }
    if !decoder.protocol.is_supported() && decoder.protocol != scopekit_analysis::Protocol::None {
        notes.push(ValidationNote::new(
            "decoder.protocol",
            format!("'{}' is not decoded yet", decoder.protocol),
        ));
    }
    if decoder.uart.baud_rate == 0 {
        notes.push(ValidationNote::new("decoder.uart.baud_rate", "0 disables UART decoding"));
    }
    if !(MIN_UART_DATA_BITS..=MAX_UART_DATA_BITS).contains(&decoder.uart.data_bits) {
        notes.push(ValidationNote::new(
            "decoder.uart.data_bits",
            format!(
                "{} is clamped to {MIN_UART_DATA_BITS}..={MAX_UART_DATA_BITS}",
                decoder.uart.data_bits
            ),
        ));
    }
    if decoder.uart.stop_bits == 0 {
        notes.push(ValidationNote::new("decoder.uart.stop_bits", "0 is treated as 1"));
    }
    if decoder.spi.cpol > 1 || decoder.spi.cpha > 1 {
        notes.push(ValidationNote::new(
            "decoder.spi",
            "cpol and cpha above 1 are treated as 1",
        ));
    }
    if !(1..=32).contains(&decoder.spi.word_size) {
        notes.push(ValidationNote::new(
            "decoder.spi.word_size",
            format!("{} is clamped to 1..=32", decoder.spi.word_size),
        ));
    }
    if !matches!(decoder.i2c.address_bits, 7 | 10) {
        notes.push(ValidationNote::new(
            "decoder.i2c.address_bits",
            format!("{} is not 7 or 10, using 7-bit addressing", decoder.i2c.address_bits),
        ));
    }

    let mut errors = Vec::new();
    for (i, item) in config.measurements.items.iter().enumerate() {
        if item.channel.trim().is_empty() {
            errors.push(ValidationError::EmptyChannel {
                kind: item.kind.as_str().to_string(),
            });
            continue;
        }
        match (item.kind.is_dual_channel(), &item.secondary) {
            (true, None) => errors.push(ValidationError::MissingSecondary {
                kind: item.kind.as_str().to_string(),
                channel: item.channel.clone(),
            }),
            (false, Some(secondary)) => notes.push(ValidationNote::new(
                &format!("measurements.items[{i}].secondary"),
                format!("'{secondary}' is ignored for '{}'", item.kind.as_str()),
            )),
            _ => {}
        }
    }

    match errors.len() {
        0 => Ok(notes),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

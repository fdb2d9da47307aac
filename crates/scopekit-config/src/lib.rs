//! Configuration for the scopekit analysis engines.
//!
//! A single TOML file holds the settings of the spectrum analyzer, the
//! protocol decoder and the measurement engine. Builders apply the settings
//! to fresh engine instances.
//!
//! # Features
//!
//! - **Load/Save**: [`ScopeConfig::load`], [`ScopeConfig::save`] with serde defaults for every field
//! - **Validation**: Notes for settings the engines will correct, errors for unusable measurements
//! - **Builders**: [`ScopeConfig::build_spectrum_analyzer`], [`ScopeConfig::build_decoder`],
//!   [`ScopeConfig::build_measurement_engine`]
//! - **Paths**: Platform-specific config directory
//!
//! # Example
//!
//! ```rust
//! use scopekit_config::{MeasurementItem, ScopeConfig};
//! use scopekit_analysis::MeasurementKind;
//!
//! let mut config = ScopeConfig::from_toml(r#"
//!     [spectrum]
//!     fft_size = 2048
//!     window = "blackman"
//! "#).unwrap();
//! config.measurements.items.push(MeasurementItem::new(MeasurementKind::Vrms, "CH1"));
//!
//! assert!(config.validate().unwrap().is_empty());
//! let analyzer = config.build_spectrum_analyzer();
//! assert_eq!(analyzer.fft_size(), 2048);
//! ```

mod error;
mod scope;

/// Platform-specific paths for the configuration file.
pub mod paths;

/// Configuration validation.
pub mod validation;

pub use error::ConfigError;
pub use paths::{
    CONFIG_FILE_NAME, default_config_path, ensure_user_config_dir, resolve_config_path,
    user_config_dir,
};
pub use scope::{DecoderSection, MeasurementItem, MeasurementsSection, ScopeConfig, SpectrumSection};
pub use validation::{ValidationError, ValidationNote, ValidationResult, validate_config};

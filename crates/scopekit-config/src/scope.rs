//! The scopekit configuration file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use scopekit_analysis::protocol::{DEFAULT_HIGH_THRESHOLD, DEFAULT_LOW_THRESHOLD};
use scopekit_analysis::spectrum::DEFAULT_FFT_SIZE;
use scopekit_analysis::{
    I2cConfig, MeasurementEngine, MeasurementId, MeasurementKind, Protocol, ProtocolDecoder,
    ScaleType, SpectrumAnalyzer, SpiConfig, UartConfig, WindowFunction,
};

use crate::error::ConfigError;
use crate::validation::{ValidationError, ValidationNote, validate_config};

/// Settings for all three analysis engines.
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// # TOML Format
///
/// ```toml
/// [spectrum]
/// window = "hanning"
/// scale = "logarithmic"
/// fft_size = 4096
///
/// [decoder]
/// protocol = "uart"
/// [decoder.uart]
/// baud_rate = 115200
///
/// [measurements]
/// statistics = true
/// [[measurements.items]]
/// kind = "vpp"
/// channel = "CH1"
/// [[measurements.items]]
/// kind = "phase"
/// channel = "CH1"
/// secondary = "CH2"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Spectrum analyzer settings.
    pub spectrum: SpectrumSection,
    /// Protocol decoder settings.
    pub decoder: DecoderSection,
    /// Measurement engine settings.
    pub measurements: MeasurementsSection,
}

/// `[spectrum]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumSection {
    /// Window applied before the FFT.
    pub window: WindowFunction,
    /// Magnitude scale.
    pub scale: ScaleType,
    /// FFT length, rounded up to a power of two when applied.
    pub fft_size: usize,
    /// Block overlap fraction.
    pub overlap: f64,
    /// Exponential averaging count.
    pub averaging: usize,
    /// Reference level in volts for dB scales.
    pub reference_level: f64,
    /// Divide magnitudes by the window's coherent gain.
    pub amplitude_correction: bool,
}

impl Default for SpectrumSection {
    fn default() -> Self {
        Self {
            window: WindowFunction::Hanning,
            scale: ScaleType::Logarithmic,
            fft_size: DEFAULT_FFT_SIZE,
            overlap: 0.5,
            averaging: 1,
            reference_level: 1.0,
            amplitude_correction: true,
        }
    }
}

/// `[decoder]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderSection {
    /// Protocol decoded by [`ProtocolDecoder::decode`].
    pub protocol: Protocol,
    /// Logic-high threshold in volts.
    pub high_threshold: f64,
    /// Logic-low threshold in volts.
    pub low_threshold: f64,
    /// UART line settings.
    pub uart: UartConfig,
    /// SPI bus settings.
    pub spi: SpiConfig,
    /// I2C bus settings.
    pub i2c: I2cConfig,
}

impl Default for DecoderSection {
    fn default() -> Self {
        Self {
            protocol: Protocol::Uart,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            low_threshold: DEFAULT_LOW_THRESHOLD,
            uart: UartConfig::default(),
            spi: SpiConfig::default(),
            i2c: I2cConfig::default(),
        }
    }
}

/// `[measurements]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementsSection {
    /// Keep running statistics.
    pub statistics: bool,
    /// Measurements to create, in order.
    pub items: Vec<MeasurementItem>,
}

impl Default for MeasurementsSection {
    fn default() -> Self {
        Self {
            statistics: true,
            items: Vec::new(),
        }
    }
}

/// One `[[measurements.items]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementItem {
    /// What to measure.
    pub kind: MeasurementKind,
    /// Primary channel name.
    pub channel: String,
    /// Second channel for phase and delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

impl MeasurementItem {
    /// Single-channel item.
    pub fn new(kind: MeasurementKind, channel: impl Into<String>) -> Self {
        Self {
            kind,
            channel: channel.into(),
            secondary: None,
        }
    }

    /// Set the second channel.
    pub fn with_secondary(mut self, channel: impl Into<String>) -> Self {
        self.secondary = Some(channel.into());
        self
    }
}

impl ScopeConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the configuration. See [`validate_config`].
    pub fn validate(&self) -> Result<Vec<ValidationNote>, ValidationError> {
        validate_config(self)
    }

    /// Fresh spectrum analyzer with these settings applied.
    pub fn build_spectrum_analyzer(&self) -> SpectrumAnalyzer {
        let s = &self.spectrum;
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.set_window(s.window);
        analyzer.set_scale(s.scale);
        analyzer.set_fft_size(s.fft_size);
        analyzer.set_overlap(s.overlap);
        analyzer.set_averaging(s.averaging);
        analyzer.set_reference_level(s.reference_level);
        analyzer.set_amplitude_correction(s.amplitude_correction);
        analyzer
    }

    /// Fresh protocol decoder with these settings applied.
    pub fn build_decoder(&self) -> ProtocolDecoder {
        let d = &self.decoder;
        let mut decoder = ProtocolDecoder::new();
        decoder.set_protocol(d.protocol);
        decoder.set_high_threshold(d.high_threshold);
        decoder.set_low_threshold(d.low_threshold);
        decoder.set_uart(d.uart);
        decoder.set_spi(d.spi);
        decoder.set_i2c(d.i2c);
        decoder
    }

    /// Fresh measurement engine holding the configured items.
    ///
    /// Ids are returned in item order. Fails when an item cannot be built.
    pub fn build_measurement_engine(&self) -> Result<(MeasurementEngine, Vec<MeasurementId>), ConfigError> {
        let notes = self.validate()?;
        for note in &notes {
            tracing::debug!(%note, "configuration corrected");
        }

        let mut engine = MeasurementEngine::new();
        engine.enable_statistics(self.measurements.statistics);

        let ids = self
            .measurements
            .items
            .iter()
            .map(|item| match (&item.secondary, item.kind.is_dual_channel()) {
                (Some(secondary), true) => engine.add_phase_measurement(item.kind, &item.channel, secondary),
                _ => engine.add_measurement(item.kind, &item.channel),
            })
            .collect();

        Ok((engine, ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = ScopeConfig::from_toml("").unwrap();
        assert_eq!(config, ScopeConfig::default());
        assert_eq!(config.spectrum.fft_size, 4096);
        assert_eq!(config.decoder.uart.baud_rate, 9600);
        assert!(config.measurements.statistics);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = ScopeConfig::from_toml(
            r#"
            [spectrum]
            window = "flattop"
            [decoder.spi]
            cpol = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.spectrum.window, WindowFunction::FlatTop);
        assert_eq!(config.spectrum.scale, ScaleType::Logarithmic);
        assert_eq!(config.decoder.spi.cpol, 1);
        assert_eq!(config.decoder.spi.word_size, 8);
    }

    #[test]
    fn unknown_enum_value_fails_to_parse() {
        let err = ScopeConfig::from_toml("[spectrum]\nwindow = \"triangle\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn builders_apply_settings() {
        let mut config = ScopeConfig::default();
        config.spectrum.fft_size = 1000;
        config.spectrum.averaging = 4;
        config.decoder.protocol = Protocol::I2c;
        config.decoder.high_threshold = 3.0;
        config.decoder.low_threshold = 1.0;

        let analyzer = config.build_spectrum_analyzer();
        assert_eq!(analyzer.fft_size(), 1024);
        assert_eq!(analyzer.averaging(), 4);

        let decoder = config.build_decoder();
        assert_eq!(decoder.protocol(), Protocol::I2c);
        assert!((decoder.threshold() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn engine_from_items() {
        let mut config = ScopeConfig::default();
        config.measurements.items = vec![
            MeasurementItem::new(MeasurementKind::Vpp, "CH1"),
            MeasurementItem::new(MeasurementKind::Phase, "CH1").with_secondary("CH2"),
        ];
        let (engine, ids) = config.build_measurement_engine().unwrap();
        assert_eq!(engine.len(), 2);
        assert!(engine.statistics_enabled());
        let phase = engine.measurement(ids[1]).unwrap();
        assert_eq!(phase.secondary.as_deref(), Some("CH2"));
    }
}

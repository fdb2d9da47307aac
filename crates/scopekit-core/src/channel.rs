//! Channel model consumed by the measurement engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::sample::{Sample, SampleStream};

/// Error returned when a channel label (probe, coupling, kind) fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} '{value}'")]
pub struct ParseLabelError {
    /// Which label family was being parsed.
    pub what: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseLabelError {
    pub(crate) fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

/// What kind of signal a channel carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Analog input channel.
    #[default]
    Analog,
    /// Logic analyzer line.
    Digital,
    /// Math channel derived from other channels.
    Math,
}

/// Input coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coupling {
    /// Direct coupling.
    #[default]
    Dc,
    /// AC coupling (DC blocked).
    Ac,
    /// Input grounded.
    Gnd,
}

impl fmt::Display for Coupling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Coupling::Dc => "DC",
            Coupling::Ac => "AC",
            Coupling::Gnd => "GND",
        })
    }
}

impl FromStr for Coupling {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DC" => Ok(Coupling::Dc),
            "AC" => Ok(Coupling::Ac),
            "GND" => Ok(Coupling::Gnd),
            _ => Err(ParseLabelError::new("coupling", s)),
        }
    }
}

/// Probe attenuation.
///
/// The factor multiplies every voltage-derived measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Probe {
    /// 1× probe.
    #[serde(rename = "1X")]
    X1,
    /// 10× probe (instrument default).
    #[default]
    #[serde(rename = "10X")]
    X10,
    /// 100× probe.
    #[serde(rename = "100X")]
    X100,
    /// 1000× probe.
    #[serde(rename = "1000X")]
    X1000,
}

impl Probe {
    /// Attenuation factor.
    pub fn factor(self) -> f64 {
        match self {
            Probe::X1 => 1.0,
            Probe::X10 => 10.0,
            Probe::X100 => 100.0,
            Probe::X1000 => 1000.0,
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Probe::X1 => "1X",
            Probe::X10 => "10X",
            Probe::X100 => "100X",
            Probe::X1000 => "1000X",
        })
    }
}

impl FromStr for Probe {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1X" | "X1" | "1" => Ok(Probe::X1),
            "10X" | "X10" | "10" => Ok(Probe::X10),
            "100X" | "X100" | "100" => Ok(Probe::X100),
            "1000X" | "X1000" | "1000" => Ok(Probe::X1000),
            _ => Err(ParseLabelError::new("probe", s)),
        }
    }
}

/// One acquisition channel: identity, vertical settings and sample data.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    name: String,
    kind: ChannelKind,
    enabled: bool,
    scale: f64,
    offset: f64,
    coupling: Coupling,
    probe: Probe,
    samples: SampleStream,
}

impl Channel {
    /// Create a disabled channel with default vertical settings
    /// (1 V/div, no offset, DC coupling, 10× probe) and no samples.
    pub fn new(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: false,
            scale: 1.0,
            offset: 0.0,
            coupling: Coupling::Dc,
            probe: Probe::X10,
            samples: Vec::new(),
        }
    }

    /// Set the probe.
    pub fn with_probe(mut self, probe: Probe) -> Self {
        self.probe = probe;
        self
    }

    /// Set the sample data.
    pub fn with_samples(mut self, samples: impl Into<SampleStream>) -> Self {
        self.samples = samples.into();
        self
    }

    /// Set the enable flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Channel name (e.g. `"CH1"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channel kind.
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Whether the channel is displayed and measured.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the channel.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Vertical scale in volts per division.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the vertical scale. Non-positive values are ignored.
    pub fn set_scale(&mut self, scale: f64) {
        if scale > 0.0 {
            self.scale = scale;
        }
    }

    /// Vertical offset in volts.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Set the vertical offset.
    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    /// Input coupling.
    pub fn coupling(&self) -> Coupling {
        self.coupling
    }

    /// Set input coupling.
    pub fn set_coupling(&mut self, coupling: Coupling) {
        self.coupling = coupling;
    }

    /// Probe setting.
    pub fn probe(&self) -> Probe {
        self.probe
    }

    /// Set the probe.
    pub fn set_probe(&mut self, probe: Probe) {
        self.probe = probe;
    }

    /// Probe attenuation factor.
    pub fn probe_factor(&self) -> f64 {
        self.probe.factor()
    }

    /// Sample data.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Replace the sample data.
    pub fn set_samples(&mut self, samples: impl Into<SampleStream>) {
        self.samples = samples.into();
    }

    /// Drop all sample data.
    pub fn clear_samples(&mut self) {
        self.samples.clear();
    }

    /// True when the channel is enabled and holds at least one sample.
    pub fn is_measurable(&self) -> bool {
        self.enabled && !self.samples.is_empty()
    }
}

/// Lookup of channels by name.
///
/// The measurement engine reads channels through this trait so hosts can
/// keep channels in whatever registry they already own.
pub trait ChannelSource {
    /// Find a channel by name.
    fn channel(&self, name: &str) -> Option<&Channel>;
}

impl ChannelSource for HashMap<String, Channel> {
    fn channel(&self, name: &str) -> Option<&Channel> {
        self.get(name)
    }
}

impl ChannelSource for BTreeMap<String, Channel> {
    fn channel(&self, name: &str) -> Option<&Channel> {
        self.get(name)
    }
}

impl ChannelSource for [Channel] {
    fn channel(&self, name: &str) -> Option<&Channel> {
        self.iter().find(|c| c.name == name)
    }
}

impl ChannelSource for Vec<Channel> {
    fn channel(&self, name: &str) -> Option<&Channel> {
        self.as_slice().channel(name)
    }
}

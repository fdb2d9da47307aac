//! Measurement kinds with their labels and units.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;

/// Scalar waveform measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    /// Peak-to-peak voltage
    Vpp,
    /// Maximum voltage
    Vmax,
    /// Minimum voltage
    Vmin,
    /// Mean voltage
    Vavg,
    /// RMS voltage
    Vrms,
    /// Top minus base
    Vamplitude,
    /// Most common high level
    Vtop,
    /// Most common low level
    Vbase,
    /// Excursion above top, % of amplitude
    Overshoot,
    /// Excursion below base, % of amplitude
    Preshoot,
    /// Frequency from mean-level crossings
    Frequency,
    /// Period from mean-level crossings
    Period,
    /// 10% to 90% rise time
    RiseTime,
    /// 90% to 10% fall time
    FallTime,
    /// Mean high-pulse width at mid level
    PositiveWidth,
    /// Mean low-pulse width at mid level
    NegativeWidth,
    /// Share of samples above the mean, %
    DutyCycle,
    /// Positive width over period, %
    PositiveDutyCycle,
    /// Negative width over period, %
    NegativeDutyCycle,
    /// Phase of channel B relative to channel A, degrees
    Phase,
    /// Delay of channel B relative to channel A, seconds
    Delay,
}

impl MeasurementKind {
    /// Every kind, in display order.
    pub const ALL: [MeasurementKind; 21] = [
        MeasurementKind::Vpp,
        MeasurementKind::Vmax,
        MeasurementKind::Vmin,
        MeasurementKind::Vavg,
        MeasurementKind::Vrms,
        MeasurementKind::Vamplitude,
        MeasurementKind::Vtop,
        MeasurementKind::Vbase,
        MeasurementKind::Overshoot,
        MeasurementKind::Preshoot,
        MeasurementKind::Frequency,
        MeasurementKind::Period,
        MeasurementKind::RiseTime,
        MeasurementKind::FallTime,
        MeasurementKind::PositiveWidth,
        MeasurementKind::NegativeWidth,
        MeasurementKind::DutyCycle,
        MeasurementKind::PositiveDutyCycle,
        MeasurementKind::NegativeDutyCycle,
        MeasurementKind::Phase,
        MeasurementKind::Delay,
    ];

    /// Short label as shown on screen.
    pub fn label(self) -> &'static str {
        match self {
            MeasurementKind::Vpp => "Vpp",
            MeasurementKind::Vmax => "Vmax",
            MeasurementKind::Vmin => "Vmin",
            MeasurementKind::Vavg => "Vavg",
            MeasurementKind::Vrms => "Vrms",
            MeasurementKind::Vamplitude => "Vamp",
            MeasurementKind::Vtop => "Vtop",
            MeasurementKind::Vbase => "Vbase",
            MeasurementKind::Overshoot => "Overshoot",
            MeasurementKind::Preshoot => "Preshoot",
            MeasurementKind::Frequency => "Freq",
            MeasurementKind::Period => "Period",
            MeasurementKind::RiseTime => "Rise",
            MeasurementKind::FallTime => "Fall",
            MeasurementKind::PositiveWidth => "+Width",
            MeasurementKind::NegativeWidth => "-Width",
            MeasurementKind::DutyCycle => "Duty",
            MeasurementKind::PositiveDutyCycle => "+Duty",
            MeasurementKind::NegativeDutyCycle => "-Duty",
            MeasurementKind::Phase => "Phase",
            MeasurementKind::Delay => "Delay",
        }
    }

    /// Unit of the measured value.
    pub fn unit(self) -> &'static str {
        match self {
            MeasurementKind::Vpp
            | MeasurementKind::Vmax
            | MeasurementKind::Vmin
            | MeasurementKind::Vavg
            | MeasurementKind::Vrms
            | MeasurementKind::Vamplitude
            | MeasurementKind::Vtop
            | MeasurementKind::Vbase => "V",
            MeasurementKind::Overshoot
            | MeasurementKind::Preshoot
            | MeasurementKind::DutyCycle
            | MeasurementKind::PositiveDutyCycle
            | MeasurementKind::NegativeDutyCycle => "%",
            MeasurementKind::Frequency => "Hz",
            MeasurementKind::Period
            | MeasurementKind::RiseTime
            | MeasurementKind::FallTime
            | MeasurementKind::PositiveWidth
            | MeasurementKind::NegativeWidth
            | MeasurementKind::Delay => "s",
            MeasurementKind::Phase => "°",
        }
    }

    /// Whether the kind compares two channels.
    pub fn is_dual_channel(self) -> bool {
        matches!(self, MeasurementKind::Phase | MeasurementKind::Delay)
    }

    /// snake_case identifier used in config files.
    pub fn as_str(self) -> &'static str {
        match self {
            MeasurementKind::Vpp => "vpp",
            MeasurementKind::Vmax => "vmax",
            MeasurementKind::Vmin => "vmin",
            MeasurementKind::Vavg => "vavg",
            MeasurementKind::Vrms => "vrms",
            MeasurementKind::Vamplitude => "vamplitude",
            MeasurementKind::Vtop => "vtop",
            MeasurementKind::Vbase => "vbase",
            MeasurementKind::Overshoot => "overshoot",
            MeasurementKind::Preshoot => "preshoot",
            MeasurementKind::Frequency => "frequency",
            MeasurementKind::Period => "period",
            MeasurementKind::RiseTime => "rise_time",
            MeasurementKind::FallTime => "fall_time",
            MeasurementKind::PositiveWidth => "positive_width",
            MeasurementKind::NegativeWidth => "negative_width",
            MeasurementKind::DutyCycle => "duty_cycle",
            MeasurementKind::PositiveDutyCycle => "positive_duty_cycle",
            MeasurementKind::NegativeDutyCycle => "negative_duty_cycle",
            MeasurementKind::Phase => "phase",
            MeasurementKind::Delay => "delay",
        }
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MeasurementKind {
    type Err = ParseEnumError;

    /// Accepts the snake_case identifier or the on-screen label, case
    /// insensitively, plus a few common abbreviations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        if let Some(kind) = Self::ALL
            .iter()
            .find(|k| k.as_str() == key || k.label().to_ascii_lowercase() == s.trim().to_ascii_lowercase())
        {
            return Ok(*kind);
        }
        match key.as_str() {
            "freq" => Ok(MeasurementKind::Frequency),
            "amplitude" | "vamp" => Ok(MeasurementKind::Vamplitude),
            "rise" => Ok(MeasurementKind::RiseTime),
            "fall" => Ok(MeasurementKind::FallTime),
            "pwidth" | "+width" => Ok(MeasurementKind::PositiveWidth),
            "nwidth" => Ok(MeasurementKind::NegativeWidth),
            "duty" => Ok(MeasurementKind::DutyCycle),
            "pduty" | "+duty" => Ok(MeasurementKind::PositiveDutyCycle),
            "nduty" => Ok(MeasurementKind::NegativeDutyCycle),
            _ => Err(ParseEnumError::new("measurement", s)),
        }
    }
}

//! Instrument waveform preamble and raw byte scaling.
//!
//! A scope returns waveform data as a block of unsigned bytes together with a
//! ten-field preamble:
//!
//! ```text
//! format,type,points,count,xincrement,xorigin,xreference,yincrement,yorigin,yreference
//! ```
//!
//! Point `i` with raw byte `r` maps to
//!
//! - voltage `(r - yreference - yorigin) · yincrement`
//! - time `(i - xreference) · xincrement + xorigin`

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::sample::{Sample, SampleStream};

/// Errors from parsing a preamble string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreambleError {
    /// The preamble did not contain ten comma-separated fields.
    #[error("expected {expected} preamble fields, found {found}")]
    FieldCount {
        /// Required number of fields.
        expected: usize,
        /// Number of fields present.
        found: usize,
    },

    /// A field could not be parsed as a number.
    #[error("invalid preamble field '{field}': '{value}'")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Raw field text.
        value: String,
    },
}

const FIELD_NAMES: [&str; 10] = [
    "format",
    "type",
    "points",
    "count",
    "xincrement",
    "xorigin",
    "xreference",
    "yincrement",
    "yorigin",
    "yreference",
];

/// Scaling parameters for one channel's waveform block.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WaveformPreamble {
    /// Data format code (0 = byte, 1 = word, 2 = ASCII).
    pub format: i32,
    /// Acquisition type code (0 = normal, 1 = maximum, 2 = raw).
    pub acquisition: i32,
    /// Number of points in the block.
    pub points: usize,
    /// Averaging count.
    pub count: u32,
    /// Time between points in seconds.
    pub x_increment: f64,
    /// Time of the reference point in seconds.
    pub x_origin: f64,
    /// Reference point index.
    pub x_reference: f64,
    /// Volts per raw code.
    pub y_increment: f64,
    /// Vertical origin in raw codes.
    pub y_origin: f64,
    /// Vertical reference in raw codes.
    pub y_reference: f64,
}

impl WaveformPreamble {
    /// Parse the comma-separated preamble response.
    pub fn parse(text: &str) -> Result<Self, PreambleError> {
        let parts: Vec<&str> = text.trim().split(',').map(str::trim).collect();
        if parts.len() < FIELD_NAMES.len() {
            return Err(PreambleError::FieldCount {
                expected: FIELD_NAMES.len(),
                found: parts.len(),
            });
        }

        let float = |i: usize| -> Result<f64, PreambleError> {
            parts[i].parse::<f64>().map_err(|_| PreambleError::InvalidField {
                field: FIELD_NAMES[i],
                value: parts[i].to_string(),
            })
        };
        let int = |i: usize| -> Result<i64, PreambleError> {
            // Some firmware prints integer fields as floats ("1200.0").
            let v = float(i)?;
            if v.fract() != 0.0 || v < i64::MIN as f64 || v > i64::MAX as f64 {
                return Err(PreambleError::InvalidField {
                    field: FIELD_NAMES[i],
                    value: parts[i].to_string(),
                });
            }
            Ok(v as i64)
        };

        Ok(Self {
            format: int(0)? as i32,
            acquisition: int(1)? as i32,
            points: int(2)?.max(0) as usize,
            count: int(3)?.max(0) as u32,
            x_increment: float(4)?,
            x_origin: float(5)?,
            x_reference: float(6)?,
            y_increment: float(7)?,
            y_origin: float(8)?,
            y_reference: float(9)?,
        })
    }

    /// Voltage of a raw code.
    #[inline]
    pub fn voltage_of(&self, raw: u8) -> f64 {
        (f64::from(raw) - self.y_reference - self.y_origin) * self.y_increment
    }

    /// Time of point `index`.
    #[inline]
    pub fn time_of(&self, index: usize) -> f64 {
        (index as f64 - self.x_reference) * self.x_increment + self.x_origin
    }

    /// Convert a raw byte block to a calibrated sample stream.
    pub fn to_samples(&self, raw: &[u8]) -> SampleStream {
        raw.iter()
            .enumerate()
            .map(|(i, &r)| Sample::new(self.time_of(i), self.voltage_of(r)))
            .collect()
    }
}

impl FromStr for WaveformPreamble {
    type Err = PreambleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPICAL: &str = "0,0,1200,1,1.000000e-06,-6.000000e-04,0,4.000000e-02,0,127\n";

    #[test]
    fn parses_typical_response() {
        let p = WaveformPreamble::parse(TYPICAL).unwrap();
        assert_eq!(p.points, 1200);
        assert_eq!(p.count, 1);
        assert!((p.x_increment - 1e-6).abs() < 1e-18);
        assert!((p.x_origin + 6e-4).abs() < 1e-15);
        assert_eq!(p.y_reference, 127.0);
    }

    #[test]
    fn scaling_formulas() {
        let p: WaveformPreamble = TYPICAL.parse().unwrap();
        assert!(p.voltage_of(127).abs() < 1e-12);
        assert!((p.voltage_of(152) - 1.0).abs() < 1e-12);
        assert!((p.time_of(0) + 6e-4).abs() < 1e-15);
        assert!((p.time_of(600) - 0.0).abs() < 1e-12);

        let samples = p.to_samples(&[127, 152, 102]);
        assert_eq!(samples.len(), 3);
        assert!((samples[2].voltage + 1.0).abs() < 1e-12);
        assert!(samples[1].time > samples[0].time);
    }

    #[test]
    fn rejects_short_preamble() {
        let err = WaveformPreamble::parse("0,0,1200").unwrap_err();
        assert_eq!(
            err,
            PreambleError::FieldCount {
                expected: 10,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_non_numeric_field() {
        let err = WaveformPreamble::parse("0,0,abc,1,1e-6,0,0,0.04,0,127").unwrap_err();
        assert!(matches!(err, PreambleError::InvalidField { field: "points", .. }));
    }

    #[test]
    fn accepts_float_formatted_integers() {
        let p = WaveformPreamble::parse("0,2,1200.0,1,1e-6,0,0,0.04,0,127").unwrap();
        assert_eq!(p.acquisition, 2);
        assert_eq!(p.points, 1200);
    }
}

//! Measurement engine: scalar waveform measurements with running statistics.
//!
//! - [`kind`] - The measurement enumeration with labels and units
//! - [`waveform`] - Per-kind pure functions over one sample stream
//! - [`stats`] - Welford running statistics
//! - [`engine`] - Id-keyed measurement set updated from a [`ChannelSource`](scopekit_core::ChannelSource)
//! - [`format`] - SI-prefix display of values

pub mod engine;
pub mod format;
pub mod kind;
pub mod stats;
pub mod waveform;

pub use engine::{Measurement, MeasurementEngine, MeasurementId};
pub use format::{INVALID_PLACEHOLDER, format_value};
pub use kind::MeasurementKind;
pub use stats::MeasurementStatistics;
pub use waveform::phase_delay;

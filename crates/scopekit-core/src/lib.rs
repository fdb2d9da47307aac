//! Scopekit Core - waveform primitives shared by the analysis engines
//!
//! This crate provides the data model every scopekit engine consumes:
//!
//! ## Samples
//!
//! - [`Sample`] - A `(time, voltage)` pair in seconds and volts
//! - [`SampleStream`] - A time-ordered sequence of samples for one channel
//! - [`stream`] - Interpolation, binary search and level-crossing helpers
//!
//! ## Channels
//!
//! - [`Channel`] - Name, enable flag, vertical settings, probe and samples
//! - [`Probe`] / [`Coupling`] / [`ChannelKind`] - Channel metadata
//! - [`ChannelSource`] - Lookup seam the measurement engine reads channels through
//!
//! ## Instrument Scaling
//!
//! - [`WaveformPreamble`] - Converts raw acquisition bytes into a [`SampleStream`]
//!
//! ## Utilities
//!
//! - Level conversions: [`amplitude_to_db`], [`db_to_power`], [`power_to_db`]
//! - [`next_power_of_two`]
//!
//! # Ordering Invariant
//!
//! Every routine that interpolates in time assumes the stream is sorted by
//! ascending time. Callers must not pass unsorted streams.
//!
//! # Example
//!
//! ```rust
//! use scopekit_core::{Channel, ChannelKind, Probe, Sample, stream};
//!
//! let samples: Vec<Sample> = (0..100)
//!     .map(|i| Sample::new(i as f64 * 1e-3, (i as f64 * 0.1).sin()))
//!     .collect();
//!
//! let mut ch1 = Channel::new("CH1", ChannelKind::Analog).with_probe(Probe::X1);
//! ch1.set_enabled(true);
//! ch1.set_samples(samples);
//!
//! let v = stream::voltage_at(ch1.samples(), 0.0105).unwrap();
//! assert!(v.is_finite());
//! ```

pub mod channel;
pub mod math;
pub mod preamble;
pub mod sample;
pub mod stream;

pub use channel::{Channel, ChannelKind, ChannelSource, Coupling, ParseLabelError, Probe};
pub use math::{DB_FLOOR, amplitude_to_db, db_to_power, next_power_of_two, power_to_db};
pub use preamble::{PreambleError, WaveformPreamble};
pub use sample::{Sample, SampleStream};

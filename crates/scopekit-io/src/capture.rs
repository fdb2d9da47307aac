//! Named sample streams loaded from one file.

use std::path::Path;

use scopekit_core::{Channel, ChannelKind, Probe, SampleStream};

use crate::{Error, Result};

/// One column of a capture.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedStream {
    /// Column name, e.g. `CH1` or `SDA`.
    pub name: String,
    /// Time-sorted samples.
    pub samples: SampleStream,
}

/// Every column read from a capture file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capture {
    /// Columns in file order.
    pub columns: Vec<NamedStream>,
}

impl Capture {
    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when the capture has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// First column.
    pub fn first(&self) -> Option<&NamedStream> {
        self.columns.first()
    }

    /// Column by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&NamedStream> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Column by name, or by 0-based index when `key` is a number.
    pub fn select(&self, key: &str) -> Option<&NamedStream> {
        self.get(key)
            .or_else(|| key.parse::<usize>().ok().and_then(|i| self.columns.get(i)))
    }

    /// Column names in file order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Append the columns of another capture.
    pub fn extend(&mut self, other: Capture) {
        self.columns.extend(other.columns);
    }

    /// Enabled analog channels at 1× probe, one per column.
    ///
    /// File values are already in volts at the probe tip.
    pub fn into_channels(self) -> Vec<Channel> {
        self.columns
            .into_iter()
            .map(|c| {
                Channel::new(c.name, ChannelKind::Analog)
                    .with_probe(Probe::X1)
                    .with_enabled(true)
                    .with_samples(c.samples)
            })
            .collect()
    }
}

/// Read a capture, choosing the format by extension.
///
/// `.wav` files are scaled by `full_scale` volts; everything else is read as
/// CSV and `full_scale` is ignored.
pub fn read_capture(path: impl AsRef<Path>, full_scale: f64) -> Result<Capture> {
    let path = path.as_ref();
    let is_wav = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    let capture = if is_wav {
        crate::wav::read_wav(path, full_scale)?
    } else {
        crate::csv::read_csv(path)?
    };

    if capture.columns.iter().all(|c| c.samples.is_empty()) {
        return Err(Error::Empty(path.to_path_buf()));
    }
    tracing::debug!(
        path = %path.display(),
        columns = capture.len(),
        "capture loaded"
    );
    Ok(capture)
}

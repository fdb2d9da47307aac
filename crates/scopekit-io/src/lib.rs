//! Capture file I/O for scopekit.
//!
//! This crate provides:
//!
//! - **Captures**: [`Capture`], a set of named sample streams sharing a file
//! - **CSV**: [`read_csv`] / [`write_csv`] for `time,CH1,CH2,...` text files
//! - **WAV**: [`read_wav`] / [`write_wav`] mapping PCM channels to volts
//!   through a full-scale voltage
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scopekit_io::read_capture;
//!
//! let capture = read_capture("uart.csv", 1.0)?;
//! let line = capture.first().expect("at least one column");
//! println!("{} samples on {}", line.samples.len(), line.name);
//! # Ok::<(), scopekit_io::Error>(())
//! ```

mod capture;
mod csv;
mod wav;

use std::path::PathBuf;

pub use capture::{Capture, NamedStream, read_capture};
pub use csv::{parse_csv, read_csv, write_csv};
pub use wav::{WavInfo, read_wav, read_wav_info, write_wav};

/// Error types for capture file operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Malformed CSV line.
    #[error("CSV line {line}: {message}")]
    Csv {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// Streams written to one file disagree in length.
    #[error("column '{name}' has {found} samples, expected {expected}")]
    LengthMismatch {
        /// Offending column.
        name: String,
        /// Length of the first column.
        expected: usize,
        /// Length of this column.
        found: usize,
    },

    /// File holds no samples.
    #[error("no samples in '{}'", .0.display())]
    Empty(PathBuf),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for capture I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

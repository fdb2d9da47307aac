//! WAV captures.
//!
//! Audio-interface and logic-analyzer exports often arrive as WAV. Each WAV
//! channel becomes one column named `CH1`, `CH2`, ... Normalized sample
//! values in `[-1, 1]` are multiplied by a full-scale voltage.

use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

use scopekit_core::{Sample, stream};

use crate::capture::{Capture, NamedStream};
use crate::{Error, Result};

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    /// Number of channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Floating-point rather than integer PCM.
    pub is_float: bool,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let total_samples = u64::from(reader.len()); // total across all channels
    let num_frames = total_samples / u64::from(spec.channels.max(1));
    let duration_secs = num_frames as f64 / f64::from(spec.sample_rate);

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs,
        is_float: spec.sample_format == SampleFormat::Float,
    })
}

/// Read a WAV file, one column per channel, scaled to `full_scale` volts.
pub fn read_wav<P: AsRef<Path>>(path: P, full_scale: f64) -> Result<Capture> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));
    let dt = 1.0 / f64::from(spec.sample_rate);

    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = f64::from(1u32 << (spec.bits_per_sample - 1));
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let frames = interleaved.len() / channels;
    let columns = (0..channels)
        .map(|ch| NamedStream {
            name: format!("CH{}", ch + 1),
            samples: (0..frames)
                .map(|i| Sample::new(i as f64 * dt, interleaved[i * channels + ch] * full_scale))
                .collect(),
        })
        .collect();

    Ok(Capture { columns })
}

/// Write a capture as 32-bit float WAV, dividing voltages by `full_scale`.
///
/// The sample rate comes from the first column's time axis and every column
/// must have the same length.
pub fn write_wav<P: AsRef<Path>>(path: P, capture: &Capture, full_scale: f64) -> Result<()> {
    let path = path.as_ref();
    let Some(first) = capture.first() else {
        return Err(Error::Empty(path.to_path_buf()));
    };
    let Some(sample_rate) = stream::sample_rate(&first.samples) else {
        return Err(Error::Empty(path.to_path_buf()));
    };
    let frames = first.samples.len();
    if let Some(bad) = capture.columns.iter().find(|c| c.samples.len() != frames) {
        return Err(Error::LengthMismatch {
            name: bad.name.clone(),
            expected: frames,
            found: bad.samples.len(),
        });
    }

    let spec = hound::WavSpec {
        channels: capture.len() as u16,
        sample_rate: sample_rate.round() as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for i in 0..frames {
        for column in &capture.columns {
            writer.write_sample((column.samples[i].voltage / full_scale) as f32)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

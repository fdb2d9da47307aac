//! Spectrum command.

use clap::Args;
use scopekit_analysis::{ScaleType, WindowFunction, format_value};
use scopekit_core::stream;
use std::path::PathBuf;

use super::common::{load_captures, load_config, select_stream};

#[derive(Args)]
pub struct SpectrumArgs {
    /// Capture file (CSV or WAV)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Column name or index (default: first column)
    #[arg(short, long)]
    channel: Option<String>,

    /// Configuration file supplying the analyzer defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// FFT size, rounded up to a power of two
    #[arg(long)]
    fft_size: Option<usize>,

    /// Window function (rectangle, hanning, hamming, blackman, flattop, kaiser)
    #[arg(long)]
    window: Option<WindowFunction>,

    /// Magnitude scale (linear, logarithmic, dbv, dbm)
    #[arg(long)]
    scale: Option<ScaleType>,

    /// Exponential averaging count across successive blocks
    #[arg(long)]
    averaging: Option<usize>,

    /// Block overlap fraction when averaging
    #[arg(long)]
    overlap: Option<f64>,

    /// Show top N peaks
    #[arg(long, default_value = "10")]
    peaks: usize,

    /// Ignore peaks at or below this magnitude
    #[arg(long, allow_hyphen_values = true)]
    threshold: Option<f64>,

    /// Report THD for this fundamental frequency
    #[arg(long, value_name = "FREQ")]
    thd: Option<f64>,

    /// Harmonics included in THD
    #[arg(long, default_value = "5")]
    harmonics: usize,

    /// Report SFDR for this fundamental frequency
    #[arg(long, value_name = "FREQ")]
    sfdr: Option<f64>,

    /// Report SNR for this signal frequency
    #[arg(long, value_name = "FREQ")]
    snr: Option<f64>,

    /// Noise bandwidth for SNR in Hz (default: Nyquist)
    #[arg(long)]
    bandwidth: Option<f64>,

    /// Volts at WAV full scale
    #[arg(long, default_value = "1.0")]
    full_scale: f64,

    /// Write the full spectrum as CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub fn run(args: SpectrumArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    let section = &mut config.spectrum;
    if let Some(size) = args.fft_size {
        section.fft_size = size;
    }
    if let Some(window) = args.window {
        section.window = window;
    }
    if let Some(scale) = args.scale {
        section.scale = scale;
    }
    if let Some(count) = args.averaging {
        section.averaging = count;
    }
    if let Some(overlap) = args.overlap {
        section.overlap = overlap;
    }
    let mut analyzer = config.build_spectrum_analyzer();

    let capture = load_captures(std::slice::from_ref(&args.input), args.full_scale)?;
    let samples = select_stream(&capture, args.channel.as_deref())?;
    let Some(sample_rate) = stream::sample_rate(&samples) else {
        anyhow::bail!("'{}' needs at least two samples with increasing time", args.input.display());
    };
    let voltages = stream::voltages(&samples);

    let fft_size = analyzer.fft_size();
    if voltages.len() < fft_size {
        anyhow::bail!(
            "{} samples is fewer than the FFT size {fft_size}; try --fft-size {}",
            voltages.len(),
            voltages.len().next_power_of_two() / 2
        );
    }

    // Successive blocks feed the averager; a single block without averaging.
    let hop = ((fft_size as f64) * (1.0 - analyzer.overlap())).round().max(1.0) as usize;
    let frames = if analyzer.averaging() > 1 {
        (voltages.len() - fft_size) / hop + 1
    } else {
        1
    };
    let mut spectrum = analyzer.compute(&voltages, sample_rate);
    for frame in 1..frames {
        spectrum = analyzer.compute(&voltages[frame * hop..], sample_rate);
    }
    tracing::debug!(frames, hop, "spectrum averaged");

    let threshold = args
        .threshold
        .unwrap_or(if spectrum.scale.is_db() { -100.0 } else { 0.0 });
    let peaks = spectrum.find_peaks(args.peaks, threshold);
    let bandwidth = args.bandwidth.unwrap_or(sample_rate / 2.0);

    let thd = args.thd.map(|f| spectrum.thd(f, args.harmonics));
    let sfdr = args.sfdr.map(|f| spectrum.sfdr(f));
    let snr = args.snr.map(|f| spectrum.snr(f, bandwidth));

    if let Some(path) = &args.output {
        let mut csv = String::from("frequency_hz,magnitude\n");
        for (f, m) in spectrum.frequencies.iter().zip(&spectrum.magnitudes) {
            csv.push_str(&format!("{f},{m}\n"));
        }
        std::fs::write(path, csv)?;
        tracing::info!(path = %path.display(), bins = spectrum.len(), "spectrum written");
    }

    if args.json {
        let report = serde_json::json!({
            "input": args.input.display().to_string(),
            "sample_rate": sample_rate,
            "fft_size": fft_size,
            "window": analyzer.window().as_str(),
            "scale": spectrum.scale.as_str(),
            "frames": frames,
            "bin_width": spectrum.bin_width(),
            "peaks": peaks,
            "thd_percent": thd,
            "sfdr_db": sfdr,
            "snr_db": snr,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let unit = spectrum.scale.unit();
    println!("Spectrum of {}", args.input.display());
    println!(
        "  {} samples at {}, FFT {fft_size}, {} window, {frames} frame(s)",
        samples.len(),
        format_value(sample_rate, "Sa/s"),
        analyzer.window()
    );
    println!("  Bin width: {}", format_value(spectrum.bin_width(), "Hz"));

    println!("\nTop {} peaks:", args.peaks);
    println!("  {:>14}  {:>12}", "Frequency", format!("Level ({unit})"));
    println!("  {:>14}  {:>12}", "---------", "-----------");
    for peak in &peaks {
        println!(
            "  {:>14}  {:>12.3}",
            format_value(peak.frequency, "Hz"),
            peak.magnitude
        );
    }
    if peaks.is_empty() {
        println!("  (none above {threshold})");
    }

    if thd.is_some() || sfdr.is_some() || snr.is_some() {
        println!();
    }
    if let (Some(f), Some(v)) = (args.thd, thd) {
        println!("  THD  @ {}: {v:.4} %", format_value(f, "Hz"));
    }
    if let (Some(f), Some(v)) = (args.sfdr, sfdr) {
        println!("  SFDR @ {}: {v:.2} dB", format_value(f, "Hz"));
    }
    if let (Some(f), Some(v)) = (args.snr, snr) {
        println!("  SNR  @ {}: {v:.2} dB", format_value(f, "Hz"));
    }

    Ok(())
}

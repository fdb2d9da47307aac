//! Protocol decode commands.

use clap::{Args, Subcommand};
use scopekit_analysis::{DecodedFrame, Parity, Protocol, estimate_bit_period, find_edges, format_value};
use std::path::PathBuf;

use super::common::{load_captures, load_config, select_optional, select_stream};

#[derive(Args)]
pub struct DecodeArgs {
    #[command(subcommand)]
    command: DecodeCommand,
}

/// Options shared by every protocol.
#[derive(Args)]
struct LineArgs {
    /// Capture files (CSV or WAV); columns from all files are merged
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Configuration file supplying the decoder defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Logic-high threshold in volts
    #[arg(long)]
    high: Option<f64>,

    /// Logic-low threshold in volts
    #[arg(long)]
    low: Option<f64>,

    /// Volts at WAV full scale
    #[arg(long, default_value = "1.0")]
    full_scale: f64,

    /// Print frames as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum DecodeCommand {
    /// Asynchronous serial
    Uart {
        #[command(flatten)]
        lines: LineArgs,

        /// Data column (default: first column)
        #[arg(long)]
        data: Option<String>,

        /// Baud rate, or "auto" to estimate it from the edges
        #[arg(long)]
        baud: Option<String>,

        /// Data bits per frame
        #[arg(long)]
        data_bits: Option<u8>,

        /// Stop bits per frame
        #[arg(long)]
        stop_bits: Option<u8>,

        /// Parity (none, odd, even)
        #[arg(long)]
        parity: Option<Parity>,

        /// Line idles low
        #[arg(long)]
        inverted: bool,
    },

    /// Inter-Integrated Circuit
    I2c {
        #[command(flatten)]
        lines: LineArgs,

        /// SDA column
        #[arg(long, default_value = "SDA")]
        sda: String,

        /// SCL column
        #[arg(long, default_value = "SCL")]
        scl: String,

        /// Address width (7 or 10)
        #[arg(long)]
        address_bits: Option<u8>,
    },

    /// Serial Peripheral Interface
    Spi {
        #[command(flatten)]
        lines: LineArgs,

        /// MOSI column
        #[arg(long, default_value = "MOSI")]
        mosi: String,

        /// MISO column
        #[arg(long)]
        miso: Option<String>,

        /// Clock column
        #[arg(long, default_value = "SCK")]
        sck: String,

        /// Active-low chip select column
        #[arg(long)]
        cs: Option<String>,

        /// SPI mode 0..=3
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
        mode: Option<u8>,

        /// Bits per word
        #[arg(long)]
        word_size: Option<u8>,

        /// Least significant bit first
        #[arg(long)]
        lsb_first: bool,
    },
}

pub fn run(args: DecodeArgs) -> anyhow::Result<()> {
    match args.command {
        DecodeCommand::Uart {
            lines,
            data,
            baud,
            data_bits,
            stop_bits,
            parity,
            inverted,
        } => {
            let mut config = load_config(lines.config.as_deref())?;
            apply_thresholds(&mut config.decoder, &lines);
            let capture = load_captures(&lines.inputs, lines.full_scale)?;
            let line = select_stream(&capture, data.as_deref())?;

            let uart = &mut config.decoder.uart;
            if let Some(bits) = data_bits {
                uart.data_bits = bits;
            }
            if let Some(bits) = stop_bits {
                uart.stop_bits = bits;
            }
            if let Some(parity) = parity {
                uart.parity = parity;
            }
            uart.inverted |= inverted;

            match baud.as_deref() {
                Some("auto") => {
                    let threshold = (config.decoder.high_threshold + config.decoder.low_threshold) / 2.0;
                    let bit_period = estimate_bit_period(&find_edges(&line, threshold));
                    if bit_period <= 0.0 {
                        anyhow::bail!("cannot estimate the baud rate: too few edges on the data line");
                    }
                    let estimated = (1.0 / bit_period).round() as u32;
                    tracing::info!(baud = estimated, "estimated baud rate");
                    config.decoder.uart.baud_rate = estimated;
                }
                Some(rate) => {
                    config.decoder.uart.baud_rate = rate
                        .parse()
                        .map_err(|_| anyhow::anyhow!("invalid baud rate '{rate}' (expected a number or 'auto')"))?;
                }
                None => {}
            }

            config.decoder.protocol = Protocol::Uart;
            let frames = config.build_decoder().decode_uart(&line);
            print_frames(&frames, lines.json)
        }

        DecodeCommand::I2c {
            lines,
            sda,
            scl,
            address_bits,
        } => {
            let mut config = load_config(lines.config.as_deref())?;
            apply_thresholds(&mut config.decoder, &lines);
            if let Some(bits) = address_bits {
                config.decoder.i2c.address_bits = bits;
            }
            let capture = load_captures(&lines.inputs, lines.full_scale)?;
            let sda = select_stream(&capture, Some(sda.as_str()))?;
            let scl = select_stream(&capture, Some(scl.as_str()))?;

            config.decoder.protocol = Protocol::I2c;
            let frames = config.build_decoder().decode(&sda, &scl, &[]);
            print_frames(&frames, lines.json)
        }

        DecodeCommand::Spi {
            lines,
            mosi,
            miso,
            sck,
            cs,
            mode,
            word_size,
            lsb_first,
        } => {
            let mut config = load_config(lines.config.as_deref())?;
            apply_thresholds(&mut config.decoder, &lines);
            let spi = &mut config.decoder.spi;
            if let Some(mode) = mode {
                *spi = spi.with_mode(mode);
            }
            if let Some(bits) = word_size {
                spi.word_size = bits;
            }
            if lsb_first {
                spi.msb_first = false;
            }

            let capture = load_captures(&lines.inputs, lines.full_scale)?;
            let mosi = select_stream(&capture, Some(mosi.as_str()))?;
            let miso = select_optional(&capture, miso.as_deref())?;
            let sck = select_stream(&capture, Some(sck.as_str()))?;
            let cs = select_optional(&capture, cs.as_deref())?;

            config.decoder.protocol = Protocol::Spi;
            let frames = config.build_decoder().decode_spi(&mosi, &miso, &sck, &cs);
            print_frames(&frames, lines.json)
        }
    }
}

fn apply_thresholds(decoder: &mut scopekit_config::DecoderSection, lines: &LineArgs) {
    if let Some(high) = lines.high {
        decoder.high_threshold = high;
    }
    if let Some(low) = lines.low {
        decoder.low_threshold = low;
    }
}

fn print_frames(frames: &[DecodedFrame], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(frames)?);
        return Ok(());
    }

    println!("  {:>12}  {:>12}  {:<8}  Description", "Start", "Duration", "Kind");
    println!("  {:>12}  {:>12}  {:<8}  -----------", "-----", "--------", "----");
    for frame in frames {
        let error = frame
            .error_message()
            .map(|e| format!("  [{e}]"))
            .unwrap_or_default();
        println!(
            "  {:>12}  {:>12}  {:<8}  {}{error}",
            format_value(frame.start_time, "s"),
            format_value(frame.duration(), "s"),
            frame.kind.to_string(),
            frame.description,
        );
    }

    let errors = frames.iter().filter(|f| f.is_error()).count();
    println!("\n{} frame(s), {errors} error(s)", frames.len());
    Ok(())
}

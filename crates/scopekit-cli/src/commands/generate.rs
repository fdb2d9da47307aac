//! Test waveform generation command.

use clap::{Args, Subcommand};
use scopekit_analysis::signal::{self, I2cBus, Noise};
use scopekit_analysis::{Parity, SpiConfig, UartConfig};
use scopekit_core::{SampleStream, stream};
use scopekit_io::{Capture, NamedStream, write_csv};
use std::path::PathBuf;

#[derive(Args)]
pub struct GenerateArgs {
    #[command(subcommand)]
    command: GenerateCommand,
}

#[derive(Subcommand)]
enum GenerateCommand {
    /// Sine wave, optionally with a phase-shifted second channel
    Sine {
        /// Output CSV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Frequency in Hz
        #[arg(long, default_value = "1000.0")]
        freq: f64,

        /// Peak amplitude in volts
        #[arg(long, default_value = "1.0")]
        amplitude: f64,

        /// DC offset in volts
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        offset: f64,

        /// Starting phase in degrees
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        phase: f64,

        /// Sample rate in Hz
        #[arg(long, default_value = "100000.0")]
        sample_rate: f64,

        /// Number of samples
        #[arg(long, default_value = "4096")]
        samples: usize,

        /// Peak amplitude of added uniform noise in volts
        #[arg(long, default_value = "0.0")]
        noise: f64,

        /// Noise seed
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Add CH2 lagging CH1 by this many degrees
        #[arg(long, allow_hyphen_values = true)]
        lag: Option<f64>,
    },

    /// Square wave
    Square {
        /// Output CSV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Frequency in Hz
        #[arg(long, default_value = "1000.0")]
        freq: f64,

        /// Low level in volts
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        low: f64,

        /// High level in volts
        #[arg(long, default_value = "3.3")]
        high: f64,

        /// High fraction of each period
        #[arg(long, default_value = "0.5")]
        duty: f64,

        /// Sample rate in Hz
        #[arg(long, default_value = "1000000.0")]
        sample_rate: f64,

        /// Number of samples
        #[arg(long, default_value = "10000")]
        samples: usize,
    },

    /// UART line carrying a text message
    Uart {
        /// Output CSV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Bytes to send
        #[arg(long, default_value = "Hello")]
        text: String,

        /// Baud rate
        #[arg(long, default_value = "9600")]
        baud: u32,

        /// Data bits per frame
        #[arg(long, default_value = "8")]
        data_bits: u8,

        /// Stop bits per frame
        #[arg(long, default_value = "1")]
        stop_bits: u8,

        /// Parity (none, odd, even)
        #[arg(long, default_value = "none")]
        parity: Parity,

        /// Line idles low
        #[arg(long)]
        inverted: bool,

        /// Samples per bit
        #[arg(long, default_value = "16")]
        samples_per_bit: usize,

        /// Logic-high level in volts
        #[arg(long, default_value = "3.3")]
        high: f64,
    },

    /// I2C write or read transaction
    I2c {
        /// Output CSV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// 7-bit target address (decimal or 0x hex)
        #[arg(long, default_value = "0x50", value_parser = parse_byte)]
        address: u8,

        /// Data bytes as text
        #[arg(long, default_value = "Hi")]
        text: String,

        /// Set the read bit
        #[arg(long)]
        read: bool,

        /// Samples per quarter bit
        #[arg(long, default_value = "5")]
        samples_per_quarter: usize,

        /// Sample rate in Hz
        #[arg(long, default_value = "1000000.0")]
        sample_rate: f64,

        /// Logic-high level in volts
        #[arg(long, default_value = "3.3")]
        high: f64,
    },

    /// SPI transfer with chip select
    Spi {
        /// Output CSV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Controller to target bytes as text
        #[arg(long, default_value = "SPI")]
        mosi: String,

        /// Target to controller bytes as text
        #[arg(long, default_value = "")]
        miso: String,

        /// SPI mode 0..=3
        #[arg(long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..=3))]
        mode: u8,

        /// Bits per word
        #[arg(long, default_value = "8")]
        word_size: u8,

        /// Least significant bit first
        #[arg(long)]
        lsb_first: bool,

        /// Samples per half clock period
        #[arg(long, default_value = "4")]
        samples_per_half: usize,

        /// Sample rate in Hz
        #[arg(long, default_value = "1000000.0")]
        sample_rate: f64,

        /// Logic-high level in volts
        #[arg(long, default_value = "3.3")]
        high: f64,
    },
}

/// Byte from decimal or `0x`-prefixed hex.
fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid byte '{s}': {e}"))
}

fn column(name: &str, samples: SampleStream) -> NamedStream {
    NamedStream {
        name: name.to_string(),
        samples,
    }
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let (output, capture) = match args.command {
        GenerateCommand::Sine {
            output,
            freq,
            amplitude,
            offset,
            phase,
            sample_rate,
            samples,
            noise,
            seed,
            lag,
        } => {
            let mut noise_gen = Noise::new(seed);
            let mut ch1 = signal::sine(samples, sample_rate, freq, amplitude, phase.to_radians(), offset);
            noise_gen.add_to(&mut ch1, noise);
            let mut columns = vec![column("CH1", stream::from_voltages(&ch1, sample_rate, 0.0))];

            if let Some(lag) = lag {
                let mut ch2 = signal::sine(samples, sample_rate, freq, amplitude, (phase - lag).to_radians(), offset);
                noise_gen.add_to(&mut ch2, noise);
                columns.push(column("CH2", stream::from_voltages(&ch2, sample_rate, 0.0)));
            }
            (output, Capture { columns })
        }

        GenerateCommand::Square {
            output,
            freq,
            low,
            high,
            duty,
            sample_rate,
            samples,
        } => {
            let wave = signal::square(samples, sample_rate, freq, low, high, duty);
            let columns = vec![column("CH1", stream::from_voltages(&wave, sample_rate, 0.0))];
            (output, Capture { columns })
        }

        GenerateCommand::Uart {
            output,
            text,
            baud,
            data_bits,
            stop_bits,
            parity,
            inverted,
            samples_per_bit,
            high,
        } => {
            if baud == 0 {
                anyhow::bail!("baud rate must be above 0");
            }
            let config = UartConfig {
                baud_rate: baud,
                data_bits,
                stop_bits,
                parity,
                inverted,
            };
            let line = signal::render_uart(text.as_bytes(), &config, samples_per_bit, high);
            (output, Capture { columns: vec![column("TX", line)] })
        }

        GenerateCommand::I2c {
            output,
            address,
            text,
            read,
            samples_per_quarter,
            sample_rate,
            high,
        } => {
            if address > 0x7F {
                anyhow::bail!("address 0x{address:02X} does not fit in 7 bits");
            }
            let bus = text
                .bytes()
                .fold(I2cBus::new(samples_per_quarter).start().address(address, read), I2cBus::byte)
                .stop();
            let (sda, scl) = signal::render_i2c(&bus, 1.0 / sample_rate, high);
            (
                output,
                Capture {
                    columns: vec![column("SDA", sda), column("SCL", scl)],
                },
            )
        }

        GenerateCommand::Spi {
            output,
            mosi,
            miso,
            mode,
            word_size,
            lsb_first,
            samples_per_half,
            sample_rate,
            high,
        } => {
            let config = SpiConfig {
                word_size,
                msb_first: !lsb_first,
                ..SpiConfig::default()
            }
            .with_mode(mode);
            let lines = signal::render_spi(
                mosi.as_bytes(),
                miso.as_bytes(),
                &config,
                samples_per_half,
                1.0 / sample_rate,
                high,
            );
            let columns = vec![
                column("MOSI", lines.mosi),
                column("MISO", lines.miso),
                column("SCK", lines.sck),
                column("CS", lines.cs),
            ];
            (output, Capture { columns })
        }
    };

    write_csv(&output, &capture)?;
    let rows = capture.first().map_or(0, |c| c.samples.len());
    println!(
        "Wrote {} ({} column(s): {}, {rows} samples)",
        output.display(),
        capture.len(),
        capture.names().join(", ")
    );
    Ok(())
}

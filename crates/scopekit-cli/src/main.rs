//! Scopekit CLI - spectrum, protocol decoding and measurements on captured waveforms.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scopekit")]
#[command(author, version, about = "Oscilloscope analysis from the command line", long_about = None)]
struct Cli {
    /// Log decoder and engine decisions (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the spectrum of a capture
    Spectrum(commands::spectrum::SpectrumArgs),

    /// Decode UART, I2C or SPI frames from captured lines
    Decode(commands::decode::DecodeArgs),

    /// Run automatic measurements on captured channels
    Measure(commands::measure::MeasureArgs),

    /// Generate test waveforms as CSV
    Generate(commands::generate::GenerateArgs),

    /// Create, show and check the configuration file
    Config(commands::config::ConfigArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Spectrum(args) => commands::spectrum::run(args),
        Commands::Decode(args) => commands::decode::run(args),
        Commands::Measure(args) => commands::measure::run(args),
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}

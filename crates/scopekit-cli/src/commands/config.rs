//! Configuration file commands.

use anyhow::Context;
use clap::{Args, Subcommand};
use scopekit_analysis::MeasurementKind;
use scopekit_config::{
    CONFIG_FILE_NAME, MeasurementItem, ScopeConfig, default_config_path, ensure_user_config_dir,
    resolve_config_path,
};
use std::path::PathBuf;

use super::common::load_config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a configuration file with default settings
    Init {
        /// Target file (default: user configuration directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration as TOML
    Show {
        /// Configuration file (default: user file if present, else defaults)
        path: Option<PathBuf>,
    },

    /// Validate a configuration file and list the corrections it implies
    Check {
        /// Configuration file (default: user file)
        path: Option<PathBuf>,
    },

    /// Print the default configuration file location
    Path,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Init { path, force } => init(path, force),
        ConfigCommand::Show { path } => {
            let config = load_config(path.as_deref())?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigCommand::Check { path } => check(path),
        ConfigCommand::Path => {
            println!("{}", default_config_path().display());
            Ok(())
        }
    }
}

fn init(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path,
        None => ensure_user_config_dir()?.join(CONFIG_FILE_NAME),
    };
    if path.exists() && !force {
        anyhow::bail!("'{}' already exists (use --force to overwrite)", path.display());
    }

    let mut config = ScopeConfig::default();
    config.measurements.items = vec![
        MeasurementItem::new(MeasurementKind::Vpp, "CH1"),
        MeasurementItem::new(MeasurementKind::Frequency, "CH1"),
    ];
    config.save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn check(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = resolve_config_path(path.as_deref());
    let config = ScopeConfig::load(&path).with_context(|| format!("failed to load '{}'", path.display()))?;

    let notes = config
        .validate()
        .with_context(|| format!("'{}' is invalid", path.display()))?;
    for note in &notes {
        println!("  note: {note}");
    }
    println!(
        "{}: OK ({} measurement(s), {} note(s))",
        path.display(),
        config.measurements.items.len(),
        notes.len()
    );
    Ok(())
}

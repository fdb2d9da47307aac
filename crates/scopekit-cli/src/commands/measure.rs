//! Measurement command.

use clap::Args;
use scopekit_analysis::{MeasurementEngine, MeasurementKind, format_value};
use scopekit_io::{Capture, NamedStream};
use std::path::PathBuf;

use super::common::{load_captures, load_config, parse_list};

/// Kinds measured when neither `--kind` nor the configuration names any.
const DEFAULT_KINDS: [MeasurementKind; 5] = [
    MeasurementKind::Vpp,
    MeasurementKind::Vrms,
    MeasurementKind::Frequency,
    MeasurementKind::Period,
    MeasurementKind::DutyCycle,
];

#[derive(Args)]
pub struct MeasureArgs {
    /// Capture files (CSV or WAV); columns from all files are merged
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Comma-separated measurements, e.g. vpp,freq,duty_cycle
    #[arg(short, long)]
    kind: Option<String>,

    /// Comma-separated channels to measure (default: every column)
    #[arg(short, long)]
    channel: Option<String>,

    /// Second channel for phase and delay
    #[arg(long)]
    reference: Option<String>,

    /// Split each capture into N chunks and keep statistics across them
    #[arg(long, default_value = "1")]
    passes: usize,

    /// Configuration file supplying the measurement list
    #[arg(long)]
    config: Option<PathBuf>,

    /// Volts at WAV full scale
    #[arg(long, default_value = "1.0")]
    full_scale: f64,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub fn run(args: MeasureArgs) -> anyhow::Result<()> {
    let capture = load_captures(&args.inputs, args.full_scale)?;
    let mut engine = build_engine(&args, &capture)?;
    if engine.is_empty() {
        anyhow::bail!("nothing to measure");
    }

    let passes = args.passes.max(1);
    if passes > 1 {
        engine.enable_statistics(true);
    }
    for pass in 0..passes {
        let channels = chunk(&capture, pass, passes).into_channels();
        engine.update_measurements(channels.as_slice());
    }
    tracing::debug!(passes, measurements = engine.len(), "measurements updated");

    if args.json {
        let report: Vec<_> = engine
            .active_measurements()
            .into_iter()
            .map(|m| {
                serde_json::json!({
                    "id": m.id,
                    "kind": m.kind.as_str(),
                    "channel": m.channel,
                    "secondary": m.secondary,
                    "value": m.valid.then_some(m.value),
                    "unit": m.unit,
                    "display": m.display_value(),
                    "statistics": engine.statistics(m.id),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let with_stats = engine.statistics_enabled();
    print!("  {:<10}  {:<10}  {:>14}", "Measure", "Channel", "Value");
    if with_stats {
        print!("  {:>14}  {:>14}  {:>14}  {:>14}  {:>5}", "Min", "Mean", "Max", "Std Dev", "N");
    }
    println!();

    for m in engine.active_measurements() {
        let channel = match &m.secondary {
            Some(secondary) => format!("{}>{secondary}", m.channel),
            None => m.channel.clone(),
        };
        print!("  {:<10}  {:<10}  {:>14}", m.label(), channel, m.display_value());
        if with_stats
            && let Some(stats) = engine.statistics(m.id)
            && stats.count > 0
        {
            print!(
                "  {:>14}  {:>14}  {:>14}  {:>14}  {:>5}",
                format_value(stats.minimum, &m.unit),
                format_value(stats.mean, &m.unit),
                format_value(stats.maximum, &m.unit),
                format_value(stats.std_dev, &m.unit),
                stats.count
            );
        }
        println!();
    }
    Ok(())
}

fn build_engine(args: &MeasureArgs, capture: &Capture) -> anyhow::Result<MeasurementEngine> {
    let Some(kinds) = args.kind.as_deref() else {
        let config = load_config(args.config.as_deref())?;
        if !config.measurements.items.is_empty() {
            let (engine, _) = config.build_measurement_engine()?;
            return Ok(engine);
        }
        return Ok(engine_for(&DEFAULT_KINDS, &channel_names(args, capture)?, None));
    };

    let kinds: Vec<MeasurementKind> = parse_list(kinds)?;
    let channels = channel_names(args, capture)?;
    if let Some(dual) = kinds.iter().find(|k| k.is_dual_channel()) {
        let Some(reference) = args.reference.as_deref() else {
            anyhow::bail!("'{}' needs a second channel: pass --reference <CHANNEL>", dual.as_str());
        };
        if capture.get(reference).is_none() {
            anyhow::bail!("reference channel '{reference}' not found");
        }
    }
    Ok(engine_for(&kinds, &channels, args.reference.as_deref()))
}

fn engine_for(kinds: &[MeasurementKind], channels: &[String], reference: Option<&str>) -> MeasurementEngine {
    let mut engine = MeasurementEngine::new();
    for channel in channels {
        for &kind in kinds {
            match reference {
                Some(reference) if kind.is_dual_channel() => {
                    if !channel.eq_ignore_ascii_case(reference) {
                        engine.add_phase_measurement(kind, channel, reference);
                    }
                }
                _ => {
                    engine.add_measurement(kind, channel);
                }
            }
        }
    }
    engine
}

fn channel_names(args: &MeasureArgs, capture: &Capture) -> anyhow::Result<Vec<String>> {
    let Some(list) = args.channel.as_deref() else {
        return Ok(capture.names().into_iter().map(str::to_string).collect());
    };
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| match capture.get(name) {
            Some(column) => Ok(column.name.clone()),
            None => anyhow::bail!("channel '{name}' not found (available: {})", capture.names().join(", ")),
        })
        .collect()
}

/// The `pass`-th of `passes` equal slices of every column.
fn chunk(capture: &Capture, pass: usize, passes: usize) -> Capture {
    let columns = capture
        .columns
        .iter()
        .map(|c| {
            let len = c.samples.len() / passes;
            let start = pass * len;
            let end = if pass + 1 == passes { c.samples.len() } else { start + len };
            NamedStream {
                name: c.name.clone(),
                samples: c.samples[start..end].to_vec(),
            }
        })
        .collect();
    Capture { columns }
}

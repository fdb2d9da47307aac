//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use scopekit_config::{ScopeConfig, paths};
use scopekit_core::SampleStream;
use scopekit_io::{Capture, read_capture};
use std::path::{Path, PathBuf};

/// Load every capture file and merge their columns in argument order.
pub fn load_captures(inputs: &[PathBuf], full_scale: f64) -> anyhow::Result<Capture> {
    let mut merged = Capture::default();
    for input in inputs {
        let capture = read_capture(input, full_scale)
            .with_context(|| format!("failed to read '{}'", input.display()))?;
        merged.extend(capture);
    }
    Ok(merged)
}

/// Column by name or index, falling back to the first column.
pub fn select_stream(capture: &Capture, key: Option<&str>) -> anyhow::Result<SampleStream> {
    let column = match key {
        Some(key) => capture.select(key),
        None => capture.first(),
    };
    match column {
        Some(column) => Ok(column.samples.clone()),
        None => anyhow::bail!(
            "channel '{}' not found (available: {})",
            key.unwrap_or("0"),
            capture.names().join(", ")
        ),
    }
}

/// Optional column: `None` when no key is given.
pub fn select_optional(capture: &Capture, key: Option<&str>) -> anyhow::Result<SampleStream> {
    match key {
        Some(key) => select_stream(capture, Some(key)),
        None => Ok(SampleStream::new()),
    }
}

/// Load the configuration file.
///
/// An explicit path must exist. Without one the user file is used when
/// present, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ScopeConfig> {
    if let Some(path) = path {
        return ScopeConfig::load(path)
            .with_context(|| format!("failed to load config '{}'", path.display()));
    }
    let path = paths::default_config_path();
    if path.exists() {
        return ScopeConfig::load(&path)
            .with_context(|| format!("failed to load config '{}'", path.display()));
    }
    Ok(ScopeConfig::default())
}

/// Parse a comma-separated list with `FromStr`.
pub fn parse_list<T>(list: &str) -> anyhow::Result<Vec<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(anyhow::Error::from))
        .collect()
}

//! Id-keyed measurement set with running statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use scopekit_core::{Channel, ChannelSource};

use super::format::{INVALID_PLACEHOLDER, format_value};
use super::kind::MeasurementKind;
use super::stats::MeasurementStatistics;
use super::waveform;

/// Stable handle to a measurement. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementId(pub u32);

impl fmt::Display for MeasurementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One configured measurement and its latest result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Handle assigned at creation
    pub id: MeasurementId,
    /// What is measured
    pub kind: MeasurementKind,
    /// Primary channel name
    pub channel: String,
    /// Second channel for phase and delay
    pub secondary: Option<String>,
    /// Latest value, 0 while invalid
    pub value: f64,
    /// Unit of `value`
    pub unit: String,
    /// Whether `value` came from usable data
    pub valid: bool,
}

impl Measurement {
    fn new(id: MeasurementId, kind: MeasurementKind, channel: String, secondary: Option<String>) -> Self {
        Self {
            id,
            kind,
            channel,
            secondary,
            value: 0.0,
            unit: kind.unit().to_string(),
            valid: false,
        }
    }

    /// On-screen label, e.g. `"Freq"`.
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    /// Value with SI prefix, or `"---"` when invalid.
    pub fn display_value(&self) -> String {
        if !self.valid {
            return INVALID_PLACEHOLDER.to_string();
        }
        format_value(self.value, &self.unit)
    }

    fn invalidate(&mut self) {
        self.value = 0.0;
        self.valid = false;
    }
}

/// Holds measurements by id and recomputes them on demand.
///
/// Statistics are kept per id and only advance for valid results while
/// enabled.
///
/// # Example
///
/// ```rust
/// use scopekit_analysis::{MeasurementEngine, MeasurementKind};
/// use scopekit_core::{Channel, ChannelKind, Probe, stream};
///
/// let volts: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.0628).sin()).collect();
/// let ch1 = Channel::new("CH1", ChannelKind::Analog)
///     .with_probe(Probe::X1)
///     .with_enabled(true)
///     .with_samples(stream::from_voltages(&volts, 10_000.0, 0.0));
/// let channels = vec![ch1];
///
/// let mut engine = MeasurementEngine::new();
/// let id = engine.add_measurement(MeasurementKind::Vpp, "CH1");
/// engine.update_measurements(&channels);
///
/// let m = engine.measurement(id).unwrap();
/// assert!(m.valid);
/// assert!((m.value - 2.0).abs() < 0.01);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeasurementEngine {
    measurements: BTreeMap<MeasurementId, Measurement>,
    statistics: BTreeMap<MeasurementId, MeasurementStatistics>,
    next_id: u32,
    statistics_enabled: bool,
}

impl MeasurementEngine {
    /// Empty engine with statistics disabled.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, kind: MeasurementKind, channel: &str, secondary: Option<&str>) -> MeasurementId {
        self.next_id += 1;
        let id = MeasurementId(self.next_id);
        self.measurements.insert(
            id,
            Measurement::new(id, kind, channel.to_string(), secondary.map(str::to_string)),
        );
        self.statistics.insert(id, MeasurementStatistics::default());
        tracing::debug!(%id, %kind, channel, ?secondary, "measurement added");
        id
    }

    /// Add a single-channel measurement.
    pub fn add_measurement(&mut self, kind: MeasurementKind, channel: &str) -> MeasurementId {
        self.insert(kind, channel, None)
    }

    /// Add a measurement of `channel_b` relative to `channel_a`.
    pub fn add_phase_measurement(
        &mut self,
        kind: MeasurementKind,
        channel_a: &str,
        channel_b: &str,
    ) -> MeasurementId {
        self.insert(kind, channel_a, Some(channel_b))
    }

    /// Remove one measurement and its statistics. Returns whether it existed.
    pub fn remove_measurement(&mut self, id: MeasurementId) -> bool {
        self.statistics.remove(&id);
        self.measurements.remove(&id).is_some()
    }

    /// Remove every measurement. Ids keep counting up.
    pub fn clear_all_measurements(&mut self) {
        self.measurements.clear();
        self.statistics.clear();
    }

    /// All measurements ordered by id.
    pub fn active_measurements(&self) -> Vec<&Measurement> {
        self.measurements.values().collect()
    }

    /// Look up one measurement.
    pub fn measurement(&self, id: MeasurementId) -> Option<&Measurement> {
        self.measurements.get(&id)
    }

    /// Statistics of one measurement.
    pub fn statistics(&self, id: MeasurementId) -> Option<&MeasurementStatistics> {
        self.statistics.get(&id)
    }

    /// Number of measurements.
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// True when no measurements are configured.
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Turn statistics on or off. Turning them off clears them.
    pub fn enable_statistics(&mut self, enabled: bool) {
        self.statistics_enabled = enabled;
        if !enabled {
            self.reset_statistics();
        }
    }

    /// Whether statistics advance on update.
    pub fn statistics_enabled(&self) -> bool {
        self.statistics_enabled
    }

    /// Clear every statistics record, keeping the measurements.
    pub fn reset_statistics(&mut self) {
        for stats in self.statistics.values_mut() {
            stats.reset();
        }
    }

    /// Recompute every measurement from `channels`.
    pub fn update_measurements<S: ChannelSource + ?Sized>(&mut self, channels: &S) {
        let measurable = |name: &str| channels.channel(name).filter(|c| c.is_measurable());

        for (id, m) in &mut self.measurements {
            let result = if m.kind.is_dual_channel() {
                let a = measurable(&m.channel);
                let b = m.secondary.as_deref().and_then(measurable);
                match (a, b) {
                    (Some(a), Some(b)) => dual_channel(m.kind, a, b),
                    _ => None,
                }
            } else {
                measurable(&m.channel).map(|ch| waveform::measure(m.kind, ch.samples(), ch.probe_factor()))
            };

            let Some(value) = result else {
                tracing::trace!(%id, kind = %m.kind, "measurement unavailable");
                m.invalidate();
                continue;
            };

            m.value = value;
            m.valid = true;
            if self.statistics_enabled {
                if let Some(stats) = self.statistics.get_mut(id) {
                    stats.update(value);
                }
            }
        }
    }
}

fn dual_channel(kind: MeasurementKind, a: &Channel, b: &Channel) -> Option<f64> {
    let (delay, phase) = waveform::phase_delay(a.samples(), b.samples())?;
    Some(match kind {
        MeasurementKind::Delay => delay,
        _ => phase,
    })
}

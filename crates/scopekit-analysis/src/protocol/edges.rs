//! Threshold edge detection shared by the protocol decoders.

use scopekit_core::Sample;
use scopekit_core::stream::crossing_time;
use serde::{Deserialize, Serialize};

/// Direction of a threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    /// Low to high
    Rising,
    /// High to low
    Falling,
}

/// An interpolated threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Crossing time in seconds
    pub time: f64,
    /// Crossing direction
    pub direction: EdgeDirection,
}

impl Edge {
    /// Whether the edge goes low to high.
    #[inline]
    pub fn is_rising(&self) -> bool {
        self.direction == EdgeDirection::Rising
    }
}

/// Every crossing of `threshold`, in time order.
///
/// A sample is high when its voltage is strictly above the threshold. Where
/// consecutive samples differ in level, the crossing time is interpolated
/// linearly between them.
pub fn find_edges(stream: &[Sample], threshold: f64) -> Vec<Edge> {
    let mut edges = Vec::new();
    let Some(first) = stream.first() else {
        return edges;
    };

    let mut prev_high = first.voltage > threshold;
    for pair in stream.windows(2) {
        let high = pair[1].voltage > threshold;
        if high != prev_high {
            edges.push(Edge {
                time: crossing_time(pair[0], pair[1], threshold),
                direction: if high {
                    EdgeDirection::Rising
                } else {
                    EdgeDirection::Falling
                },
            });
        }
        prev_high = high;
    }
    edges
}

/// Estimate the bit period of a serial line from its edges.
///
/// Takes the spacing between each edge and the one two positions earlier
/// when both go the same way, and returns half the median. Returns 0 with
/// fewer than four edges.
pub fn estimate_bit_period(edges: &[Edge]) -> f64 {
    if edges.len() < 4 {
        return 0.0;
    }

    let mut spans: Vec<f64> = edges
        .windows(3)
        .filter(|w| w[0].direction == w[2].direction)
        .map(|w| w[2].time - w[0].time)
        .collect();

    if spans.is_empty() {
        return 0.0;
    }
    spans.sort_by(f64::total_cmp);
    spans[spans.len() / 2] / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(periods: usize, half: usize, dt: f64) -> Vec<Sample> {
        (0..periods * 2 * half)
            .map(|i| {
                let high = (i / half) % 2 == 1;
                Sample::new(i as f64 * dt, if high { 3.3 } else { 0.0 })
            })
            .collect()
    }

    #[test]
    fn edges_alternate_and_interpolate() {
        let s = square(3, 10, 1.0);
        let edges = find_edges(&s, 1.65);
        assert_eq!(edges.len(), 5);
        assert!(edges[0].is_rising());
        assert!(!edges[1].is_rising());
        assert!((edges[0].time - 9.5).abs() < 1e-12);
        assert!((edges[1].time - 19.5).abs() < 1e-12);
    }

    #[test]
    fn sloped_crossing() {
        let s = [Sample::new(0.0, 0.0), Sample::new(1.0, 1.0), Sample::new(2.0, 0.0)];
        let edges = find_edges(&s, 0.25);
        assert_eq!(edges.len(), 2);
        assert!((edges[0].time - 0.25).abs() < 1e-12);
        assert!((edges[1].time - 1.75).abs() < 1e-12);
    }

    #[test]
    fn degenerate_streams() {
        assert!(find_edges(&[], 1.0).is_empty());
        assert!(find_edges(&[Sample::new(0.0, 5.0)], 1.0).is_empty());
    }

    #[test]
    fn bit_period_from_clock() {
        // Half period of 10 samples at dt = 1 µs
        let s = square(8, 10, 1e-6);
        let period = estimate_bit_period(&find_edges(&s, 1.65));
        assert!((period - 10e-6).abs() < 1e-12);
        assert_eq!(estimate_bit_period(&find_edges(&square(1, 10, 1e-6), 1.65)), 0.0);
    }
}

//! Property-based tests for scopekit-core stream primitives.
//!
//! Interpolation and crossing detection are checked against randomized,
//! time-sorted streams using proptest.

use proptest::prelude::*;
use scopekit_core::{Sample, WaveformPreamble, stream};

/// Strategy producing a sorted stream with strictly increasing times.
fn sorted_stream() -> impl Strategy<Value = Vec<Sample>> {
    prop::collection::vec((1e-6f64..1e-3, -5.0f64..5.0), 2..200).prop_map(|steps| {
        let mut t = 0.0;
        steps
            .into_iter()
            .map(|(dt, v)| {
                t += dt;
                Sample::new(t, v)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Interpolated voltage never leaves the range spanned by the stream.
    #[test]
    fn voltage_at_stays_within_range(s in sorted_stream(), frac in 0.0f64..1.0) {
        let (lo, hi) = stream::voltage_range(&s).unwrap();
        let t0 = s[0].time;
        let t1 = s[s.len() - 1].time;
        let v = stream::voltage_at(&s, t0 + frac * (t1 - t0)).unwrap();
        prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9, "{v} outside [{lo}, {hi}]");
    }

    /// Interpolation hits every sample exactly at its own timestamp.
    #[test]
    fn voltage_at_sample_times_is_exact(s in sorted_stream()) {
        for sample in &s {
            let v = stream::voltage_at(&s, sample.time).unwrap();
            prop_assert!((v - sample.voltage).abs() < 1e-9);
        }
    }

    /// Every rising crossing lies inside the stream's time span and the
    /// crossings come out sorted.
    #[test]
    fn rising_crossings_are_sorted_and_bounded(s in sorted_stream(), level in -4.0f64..4.0) {
        let crossings = stream::rising_crossings(&s, level);
        let t0 = s[0].time;
        let t1 = s[s.len() - 1].time;
        for w in crossings.windows(2) {
            prop_assert!(w[0] <= w[1]);
        }
        for &t in &crossings {
            prop_assert!(t >= t0 - 1e-12 && t <= t1 + 1e-12);
        }
    }

    /// Preamble scaling is affine in the raw code.
    #[test]
    fn preamble_voltage_is_affine(yinc in 1e-4f64..1.0, yref in 0.0f64..255.0, raw in 0u8..255) {
        let p = WaveformPreamble {
            y_increment: yinc,
            y_reference: yref,
            ..Default::default()
        };
        let step = p.voltage_of(raw + 1) - p.voltage_of(raw);
        prop_assert!((step - yinc).abs() < 1e-9);
    }
}

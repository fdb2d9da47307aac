//! SI-prefix formatting for measurement readouts.

/// Placeholder shown for measurements that cannot be computed yet.
pub const INVALID_PLACEHOLDER: &str = "---";

const PREFIXES: [(f64, &str); 6] = [
    (1e6, "M"),
    (1e3, "k"),
    (1.0, ""),
    (1e-3, "m"),
    (1e-6, "µ"),
    (1e-9, "n"),
];

/// Format `value` with three decimals and an SI prefix on `unit`.
///
/// Magnitudes below one nano-unit fall back to scientific notation.
///
/// ```rust
/// use scopekit_analysis::measure::format_value;
///
/// assert_eq!(format_value(1234.5, "Hz"), "1.234 kHz");
/// assert_eq!(format_value(0.0025, "s"), "2.500 ms");
/// assert_eq!(format_value(0.0, "V"), "0 V");
/// ```
pub fn format_value(value: f64, unit: &str) -> String {
    if !value.is_finite() {
        return INVALID_PLACEHOLDER.to_string();
    }
    if value == 0.0 {
        return format!("0 {unit}");
    }

    let magnitude = value.abs();
    for (scale, prefix) in PREFIXES {
        if magnitude >= scale {
            return format!("{:.3} {prefix}{unit}", value / scale);
        }
    }
    format!("{value:.3e} {unit}")
}

//! UART decoding by mid-bit sampling.

use scopekit_core::Sample;
use scopekit_core::stream::level_at;

use super::edges::{EdgeDirection, find_edges};
use super::{DecodedFrame, FrameError, FrameKind, UartConfig};

pub(super) fn decode(data: &[Sample], config: &UartConfig, threshold: f64) -> Vec<DecodedFrame> {
    let mut frames = Vec::new();
    let Some(last) = data.last() else {
        return frames;
    };

    let bit_period = config.bit_period();
    if bit_period <= 0.0 {
        tracing::debug!(baud = config.baud_rate, "UART decode skipped: invalid baud rate");
        return frames;
    }

    let edges = find_edges(data, threshold);
    let start_direction = if config.inverted {
        EdgeDirection::Rising
    } else {
        EdgeDirection::Falling
    };

    let data_bits = config.word_bits();
    let stop_bits = config.stop_bit_count();
    let parity_bits = config.parity.bits();
    // Logical 1 is the idle level.
    let bit_at = |t: f64| level_at(data, t, threshold) != config.inverted;

    let mut idx = 0;
    while idx < edges.len() {
        if edges[idx].direction != start_direction {
            idx += 1;
            continue;
        }

        let start = edges[idx].time;
        let sample_time = |bit: u32| start + bit_period * (1.5 + f64::from(bit));

        let last_stop = sample_time(data_bits + parity_bits + stop_bits - 1);
        if last_stop > last.time {
            tracing::trace!(start, "UART frame runs past end of capture");
            break;
        }

        let mut value: u16 = 0;
        for bit in 0..data_bits {
            if bit_at(sample_time(bit)) {
                value |= 1 << bit;
            }
        }

        let parity_error = if parity_bits > 0 {
            let parity_bit = bit_at(sample_time(data_bits));
            let ones = value.count_ones() + u32::from(parity_bit);
            !config.parity.is_satisfied(ones)
        } else {
            false
        };

        let framing_error = (0..stop_bits)
            .any(|s| !bit_at(sample_time(data_bits + parity_bits + s)));

        let end = start + bit_period * f64::from(config.frame_bits());

        let mut payload = vec![(value & 0xFF) as u8];
        if data_bits > 8 {
            payload.push((value >> 8) as u8);
        }
        let description = if value > 0xFF {
            format!("0x{value:03X}")
        } else if (32..127).contains(&value) {
            format!("0x{value:02X} '{}'", value as u8 as char)
        } else {
            format!("0x{value:02X}")
        };

        let mut frame = DecodedFrame::new(FrameKind::Data, start, end)
            .with_data(payload)
            .with_description(description);
        frame.error = FrameError::from_flags(parity_error, framing_error);
        if let Some(err) = frame.error {
            tracing::trace!(start, %err, "UART frame error");
        }
        frames.push(frame);

        // Skip edges inside this frame. The next start bit may begin exactly
        // at `end`, so stop half a bit short of it.
        let resume = end - bit_period / 2.0;
        while idx < edges.len() && edges[idx].time < resume {
            idx += 1;
        }
    }

    frames
}

//! SPI decoding on the CPOL/CPHA sampling edge.

use scopekit_core::Sample;
use scopekit_core::stream::level_at;

use super::edges::{EdgeDirection, find_edges};
use super::{DecodedFrame, FrameKind, SpiConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Event {
    Clock(EdgeDirection),
    Deselect,
}

/// MOSI/MISO shift registers for the word in progress.
#[derive(Debug, Default)]
struct Word {
    mosi: u32,
    miso: u32,
    bits: u8,
    start: f64,
}

impl Word {
    fn push(&mut self, mosi: bool, miso: bool, msb_first: bool) {
        if msb_first {
            self.mosi = (self.mosi << 1) | u32::from(mosi);
            self.miso = (self.miso << 1) | u32::from(miso);
        } else {
            self.mosi |= u32::from(mosi) << self.bits;
            self.miso |= u32::from(miso) << self.bits;
        }
        self.bits += 1;
    }

    fn frame(&self, word_size: u8, end: f64) -> DecodedFrame {
        let width = usize::from(word_size).div_ceil(4);
        let byte_count = usize::from(word_size).div_ceil(8);

        let mut data = Vec::with_capacity(byte_count * 2);
        for value in [self.mosi, self.miso] {
            data.extend_from_slice(&value.to_be_bytes()[4 - byte_count..]);
        }

        DecodedFrame::new(FrameKind::Data, self.start, end)
            .with_data(data)
            .with_description(format!(
                "MOSI: 0x{:0width$X} MISO: 0x{:0width$X}",
                self.mosi, self.miso
            ))
    }
}

pub(super) fn decode(
    mosi: &[Sample],
    miso: &[Sample],
    sck: &[Sample],
    cs: &[Sample],
    config: &SpiConfig,
    threshold: f64,
) -> Vec<DecodedFrame> {
    let mut frames = Vec::new();
    if sck.is_empty() {
        return frames;
    }

    let word_size = config.word_size.clamp(1, 32);
    let sample_direction = if config.sample_on_rising() {
        EdgeDirection::Rising
    } else {
        EdgeDirection::Falling
    };

    let mut events: Vec<(f64, Event)> = find_edges(sck, threshold)
        .into_iter()
        .map(|e| (e.time, Event::Clock(e.direction)))
        .collect();
    if !cs.is_empty() {
        events.extend(
            find_edges(cs, threshold)
                .into_iter()
                .filter(|e| e.is_rising())
                .map(|e| (e.time, Event::Deselect)),
        );
        events.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    let sample = |line: &[Sample], t: f64| !line.is_empty() && level_at(line, t, threshold);
    let mut word = Word::default();

    for (time, event) in events {
        match event {
            Event::Deselect => {
                if word.bits > 0 {
                    tracing::trace!(bits = word.bits, "partial SPI word flushed on CS deassert");
                    frames.push(word.frame(word_size, time));
                }
                word = Word::default();
            }
            Event::Clock(direction) => {
                // Chip select is active low.
                if !cs.is_empty() && level_at(cs, time, threshold) {
                    continue;
                }
                if direction != sample_direction {
                    continue;
                }
                if word.bits == 0 {
                    word.start = time;
                }
                word.push(sample(mosi, time), sample(miso, time), config.msb_first);
                if word.bits >= word_size {
                    frames.push(word.frame(word_size, time));
                    word = Word::default();
                }
            }
        }
    }

    frames
}

//! I2C decoding from SDA/SCL edge events.
//!
//! SDA edges and SCL rising edges are merged in time order. An SDA edge
//! while SCL is high is a bus condition (falling = START, rising = STOP);
//! every SCL rising edge samples one bit.

use scopekit_core::Sample;
use scopekit_core::stream::level_at;

use super::edges::{EdgeDirection, find_edges};
use super::{DecodedFrame, FrameKind, I2cConfig, describe_byte};

/// High five bits of the first byte of a 10-bit address.
const TEN_BIT_PREFIX: u8 = 0b1111_0000;
const TEN_BIT_MASK: u8 = 0b1111_1000;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Event {
    Sda(EdgeDirection),
    SclRise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Address,
    /// Acknowledge after the first byte of a 10-bit address
    ExtendedAck,
    ExtendedAddress,
    AddressAck,
    Data,
    DataAck,
}

/// MSB-first shift register for one byte.
#[derive(Debug, Clone, Copy, Default)]
struct ByteReader {
    value: u8,
    bits: u8,
    start: f64,
}

impl ByteReader {
    fn starting_at(start: f64) -> Self {
        Self {
            value: 0,
            bits: 0,
            start,
        }
    }

    /// Shift in a bit; returns the byte once eight bits are in.
    fn push(&mut self, bit: bool) -> Option<u8> {
        self.value = (self.value << 1) | u8::from(bit);
        self.bits += 1;
        (self.bits == 8).then_some(self.value)
    }
}

pub(super) fn decode(
    sda: &[Sample],
    scl: &[Sample],
    config: &I2cConfig,
    threshold: f64,
) -> Vec<DecodedFrame> {
    let mut frames = Vec::new();
    if sda.is_empty() || scl.is_empty() {
        return frames;
    }

    let mut events: Vec<(f64, Event)> = find_edges(sda, threshold)
        .into_iter()
        .map(|e| (e.time, Event::Sda(e.direction)))
        .chain(
            find_edges(scl, threshold)
                .into_iter()
                .filter(|e| e.is_rising())
                .map(|e| (e.time, Event::SclRise)),
        )
        .collect();
    events.sort_by(|a, b| a.0.total_cmp(&b.0));

    let ten_bit = config.address_bits == 10;
    let mut phase = Phase::Idle;
    let mut reader = ByteReader::default();
    let mut bus_start = 0.0;
    let mut first_address_byte = 0u8;

    for (time, event) in events {
        match event {
            Event::Sda(direction) => {
                if !level_at(scl, time, threshold) {
                    continue;
                }
                match direction {
                    EdgeDirection::Falling => {
                        if phase != Phase::Idle {
                            tracing::trace!(time, "repeated START");
                        }
                        frames.push(
                            DecodedFrame::new(FrameKind::Start, time, time)
                                .with_description("Start condition"),
                        );
                        bus_start = time;
                        reader = ByteReader::starting_at(time);
                        phase = Phase::Address;
                    }
                    EdgeDirection::Rising => {
                        if phase == Phase::Idle {
                            continue;
                        }
                        frames.push(
                            DecodedFrame::new(FrameKind::Stop, time, time)
                                .with_description("Stop condition"),
                        );
                        phase = Phase::Idle;
                    }
                }
            }
            Event::SclRise => {
                let bit = level_at(sda, time, threshold);
                match phase {
                    Phase::Idle => {}
                    Phase::Address => {
                        if let Some(byte) = reader.push(bit) {
                            if ten_bit && byte & TEN_BIT_MASK == TEN_BIT_PREFIX {
                                first_address_byte = byte;
                                phase = Phase::ExtendedAck;
                            } else {
                                frames.push(address_frame(&[byte], bus_start, time));
                                phase = Phase::AddressAck;
                            }
                        }
                    }
                    Phase::ExtendedAck => {
                        if bit {
                            // Nobody claimed the upper address bits.
                            frames.push(address_frame(&[first_address_byte], bus_start, time));
                            frames.push(ack_frame(false, time));
                            phase = Phase::Data;
                            reader = ByteReader::starting_at(time);
                        } else {
                            phase = Phase::ExtendedAddress;
                            reader = ByteReader::starting_at(time);
                        }
                    }
                    Phase::ExtendedAddress => {
                        if let Some(byte) = reader.push(bit) {
                            frames.push(address_frame(&[first_address_byte, byte], bus_start, time));
                            phase = Phase::AddressAck;
                        }
                    }
                    Phase::AddressAck | Phase::DataAck => {
                        frames.push(ack_frame(!bit, time));
                        phase = Phase::Data;
                        reader = ByteReader::default();
                    }
                    Phase::Data => {
                        if reader.bits == 0 {
                            reader.start = time;
                        }
                        if let Some(byte) = reader.push(bit) {
                            frames.push(
                                DecodedFrame::new(FrameKind::Data, reader.start, time)
                                    .with_data(vec![byte])
                                    .with_description(describe_byte(byte)),
                            );
                            phase = Phase::DataAck;
                        }
                    }
                }
            }
        }
    }

    frames
}

/// ADDRESS frame for a 7-bit address byte or a two-byte 10-bit address.
fn address_frame(bytes: &[u8], start: f64, end: f64) -> DecodedFrame {
    let first = bytes[0];
    let read = first & 0x01 != 0;
    let direction = if read { "READ" } else { "WRITE" };

    let description = match bytes {
        [_, second] => {
            let address = (u16::from((first >> 1) & 0x03) << 8) | u16::from(*second);
            format!("Addr: 0x{address:03X} {direction}")
        }
        _ => format!("Addr: 0x{:02X} {direction}", first >> 1),
    };

    DecodedFrame::new(FrameKind::Address, start, end)
        .with_data(bytes.to_vec())
        .with_description(description)
}

fn ack_frame(ack: bool, time: f64) -> DecodedFrame {
    if ack {
        DecodedFrame::new(FrameKind::Ack, time, time).with_description("Acknowledge")
    } else {
        DecodedFrame::new(FrameKind::Nak, time, time).with_description("Not Acknowledge")
    }
}

//! Synthetic test waveforms.
//!
//! Analog tones for the spectrum analyzer and measurement engine, plus
//! renderers that turn bytes into UART, I2C and SPI line captures for the
//! protocol decoder. Everything is deterministic so tests and the CLI
//! `generate` command produce identical captures run to run.

use scopekit_core::{Sample, SampleStream};
use std::f64::consts::PI;

use crate::protocol::{SpiConfig, UartConfig};

/// Sine wave `amplitude · sin(2π·freq·t + phase)` plus `offset`.
pub fn sine(
    samples: usize,
    sample_rate: f64,
    freq: f64,
    amplitude: f64,
    phase: f64,
    offset: f64,
) -> Vec<f64> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            offset + amplitude * (2.0 * PI * freq * t + phase).sin()
        })
        .collect()
}

/// Square wave between `low` and `high`, high for the first `duty` fraction
/// of each period.
pub fn square(samples: usize, sample_rate: f64, freq: f64, low: f64, high: f64, duty: f64) -> Vec<f64> {
    let duty = duty.clamp(0.0, 1.0);
    (0..samples)
        .map(|i| {
            let cycle = (i as f64 * freq / sample_rate).fract();
            if cycle < duty { high } else { low }
        })
        .collect()
}

/// Xorshift64 generator for reproducible noise.
#[derive(Debug, Clone)]
pub struct Noise {
    state: u64,
}

impl Noise {
    /// Create a generator. A zero seed is replaced with a fixed constant.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    /// Next value, uniform in `[-1, 1)`.
    pub fn next_bipolar(&mut self) -> f64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        // Top 53 bits as a fraction in [0, 1)
        let unit = (self.state >> 11) as f64 / (1u64 << 53) as f64;
        unit * 2.0 - 1.0
    }

    /// Add uniform noise of peak `amplitude` to every value.
    pub fn add_to(&mut self, signal: &mut [f64], amplitude: f64) {
        for v in signal {
            *v += amplitude * self.next_bipolar();
        }
    }
}

/// Logic levels held for whole bit slots.
struct LineWriter {
    samples: SampleStream,
    dt: f64,
}

impl LineWriter {
    fn new(dt: f64) -> Self {
        Self {
            samples: Vec::new(),
            dt,
        }
    }

    fn hold(&mut self, volts: f64, count: usize) {
        for _ in 0..count {
            let t = self.samples.len() as f64 * self.dt;
            self.samples.push(Sample::new(t, volts));
        }
    }
}

/// Render bytes as a UART line at `samples_per_bit` samples per bit.
///
/// The capture opens and closes with two idle bit times, and frames follow
/// back to back. Only the low [`UartConfig::word_bits`] of each byte are sent.
pub fn render_uart(bytes: &[u8], config: &UartConfig, samples_per_bit: usize, high: f64) -> SampleStream {
    let samples_per_bit = samples_per_bit.max(1);
    let dt = config.bit_period() / samples_per_bit as f64;
    let (idle, active) = if config.inverted { (0.0, high) } else { (high, 0.0) };
    let level = |one: bool| if one { idle } else { active };

    let mut line = LineWriter::new(dt);
    line.hold(idle, 2 * samples_per_bit);

    for &byte in bytes {
        let value = u16::from(byte);
        line.hold(active, samples_per_bit);

        let mut ones = 0;
        for bit in 0..config.word_bits() {
            let one = (value >> bit) & 1 == 1;
            ones += u32::from(one);
            line.hold(level(one), samples_per_bit);
        }
        if config.parity.bits() > 0 {
            line.hold(level(config.parity.bit_for(ones)), samples_per_bit);
        }
        line.hold(idle, config.stop_bit_count() as usize * samples_per_bit);
    }

    line.hold(idle, 2 * samples_per_bit);
    line.samples
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BusOp {
    Start,
    Stop,
    Bit(bool),
}

/// Builder for a synthetic I2C transaction.
///
/// Each bit occupies four quarter-periods of `samples_per_quarter` samples:
/// SCL low, high, high, low, with SDA changing only while SCL is low.
#[derive(Debug, Clone)]
pub struct I2cBus {
    samples_per_quarter: usize,
    ops: Vec<BusOp>,
}

impl I2cBus {
    /// Empty transaction.
    pub fn new(samples_per_quarter: usize) -> Self {
        Self {
            samples_per_quarter: samples_per_quarter.max(1),
            ops: Vec::new(),
        }
    }

    /// START (or repeated START) condition.
    pub fn start(mut self) -> Self {
        self.ops.push(BusOp::Start);
        self
    }

    /// STOP condition.
    pub fn stop(mut self) -> Self {
        self.ops.push(BusOp::Stop);
        self
    }

    /// 7-bit address with read flag, acknowledged by the target.
    pub fn address(self, address: u8, read: bool) -> Self {
        self.address_with_ack(address, read, true)
    }

    /// 7-bit address with explicit acknowledge.
    pub fn address_with_ack(self, address: u8, read: bool, ack: bool) -> Self {
        self.raw_byte((address << 1) | u8::from(read), ack)
    }

    /// Data byte, acknowledged.
    pub fn byte(self, byte: u8) -> Self {
        self.raw_byte(byte, true)
    }

    /// Eight bits MSB-first followed by an ACK (`true`) or NAK bit.
    pub fn raw_byte(mut self, byte: u8, ack: bool) -> Self {
        for bit in (0..8).rev() {
            self.ops.push(BusOp::Bit((byte >> bit) & 1 == 1));
        }
        self.ops.push(BusOp::Bit(!ack));
        self
    }
}

/// Render an [`I2cBus`] as `(sda, scl)` captures with sample spacing `dt`.
pub fn render_i2c(bus: &I2cBus, dt: f64, high: f64) -> (SampleStream, SampleStream) {
    let q = bus.samples_per_quarter;
    let mut sda = LineWriter::new(dt);
    let mut scl = LineWriter::new(dt);
    let volts = |one: bool| if one { high } else { 0.0 };

    let mut quarter = |sda_high: bool, scl_high: bool| {
        sda.hold(volts(sda_high), q);
        scl.hold(volts(scl_high), q);
    };

    for _ in 0..4 {
        quarter(true, true);
    }

    for op in &bus.ops {
        match *op {
            BusOp::Start => {
                quarter(true, false);
                quarter(true, true);
                quarter(false, true);
                quarter(false, false);
            }
            BusOp::Stop => {
                quarter(false, false);
                quarter(false, true);
                quarter(true, true);
                quarter(true, true);
            }
            BusOp::Bit(b) => {
                quarter(b, false);
                quarter(b, true);
                quarter(b, true);
                quarter(b, false);
            }
        }
    }

    for _ in 0..4 {
        quarter(true, true);
    }

    (sda.samples, scl.samples)
}

/// SPI line captures produced by [`render_spi`].
#[derive(Debug, Clone, Default)]
pub struct SpiLines {
    /// Controller to target data
    pub mosi: SampleStream,
    /// Target to controller data
    pub miso: SampleStream,
    /// Serial clock
    pub sck: SampleStream,
    /// Active-low chip select
    pub cs: SampleStream,
}

/// Group bytes into big-endian words of `ceil(word_size/8)` bytes.
fn words(bytes: &[u8], word_size: u8) -> Vec<u32> {
    let per_word = usize::from(word_size).div_ceil(8).max(1);
    let mask = if word_size >= 32 {
        u32::MAX
    } else {
        (1u32 << word_size) - 1
    };
    bytes
        .chunks(per_word)
        .map(|chunk| chunk.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)) & mask)
        .collect()
}

/// Render one SPI transfer with chip select held low around it.
///
/// `mosi` and `miso` are split into words as described for
/// [`DecodedFrame`](crate::protocol::DecodedFrame) payloads; the shorter
/// side is padded with zero words. Each bit lasts two half-periods of
/// `samples_per_half` samples.
pub fn render_spi(
    mosi: &[u8],
    miso: &[u8],
    config: &SpiConfig,
    samples_per_half: usize,
    dt: f64,
    high: f64,
) -> SpiLines {
    let h = samples_per_half.max(1);
    let word_size = config.word_size.clamp(1, 32);
    let mosi_words = words(mosi, word_size);
    let miso_words = words(miso, word_size);
    let count = mosi_words.len().max(miso_words.len());

    let volts = |one: bool| if one { high } else { 0.0 };
    let idle_clock = config.cpol != 0;
    let leading_sample = config.cpha == 0;

    let mut lines = [
        LineWriter::new(dt),
        LineWriter::new(dt),
        LineWriter::new(dt),
        LineWriter::new(dt),
    ];
    let mut hold = |mosi_bit: bool, miso_bit: bool, clock: bool, selected: bool| {
        lines[0].hold(volts(mosi_bit), h);
        lines[1].hold(volts(miso_bit), h);
        lines[2].hold(volts(clock), h);
        lines[3].hold(volts(!selected), h);
    };

    for _ in 0..2 {
        hold(false, false, idle_clock, false);
    }
    for _ in 0..2 {
        hold(false, false, idle_clock, true);
    }

    for i in 0..count {
        let out = mosi_words.get(i).copied().unwrap_or(0);
        let inp = miso_words.get(i).copied().unwrap_or(0);
        for n in 0..word_size {
            let shift = if config.msb_first { word_size - 1 - n } else { n };
            let a = (out >> shift) & 1 == 1;
            let b = (inp >> shift) & 1 == 1;
            if leading_sample {
                hold(a, b, idle_clock, true);
                hold(a, b, !idle_clock, true);
            } else {
                hold(a, b, !idle_clock, true);
                hold(a, b, idle_clock, true);
            }
        }
    }

    for _ in 0..2 {
        hold(false, false, idle_clock, true);
    }
    for _ in 0..2 {
        hold(false, false, idle_clock, false);
    }

    let [mosi, miso, sck, cs] = lines.map(|l| l.samples);
    SpiLines { mosi, miso, sck, cs }
}

//! Serial protocol decoder for UART, SPI and I2C captures.
//!
//! Every protocol thresholds its lines at the midpoint of the decoder's
//! high/low threshold pair, then works on interpolated edge times
//! ([`find_edges`]) and interpolated levels at arbitrary times
//! ([`level_at`](scopekit_core::stream::level_at)).
//!
//! Decoding never fails: short or malformed captures yield an empty or
//! truncated frame list, and UART parity/framing problems are reported on
//! the affected [`DecodedFrame`].
//!
//! # Example
//!
//! ```rust
//! use scopekit_analysis::protocol::{Protocol, ProtocolDecoder, UartConfig};
//! use scopekit_analysis::signal::render_uart;
//!
//! let config = UartConfig::default();
//! let line = render_uart(b"Hi", &config, 20, 3.3);
//!
//! let mut decoder = ProtocolDecoder::new();
//! decoder.set_protocol(Protocol::Uart);
//! let frames = decoder.decode(&line, &[], &[]);
//!
//! assert_eq!(frames.len(), 2);
//! assert_eq!(frames[0].data, vec![b'H']);
//! assert!(!frames[1].is_error());
//! ```

mod edges;
mod i2c;
mod spi;
mod uart;

pub use edges::{Edge, EdgeDirection, estimate_bit_period, find_edges};

use scopekit_core::Sample;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;

/// Bus protocol selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Decoding disabled
    #[default]
    None,
    /// Asynchronous serial
    Uart,
    /// Serial Peripheral Interface
    Spi,
    /// Inter-Integrated Circuit
    I2c,
    /// Controller Area Network (not decoded)
    Can,
    /// Local Interconnect Network (not decoded)
    Lin,
}

impl Protocol {
    /// Lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::None => "none",
            Protocol::Uart => "uart",
            Protocol::Spi => "spi",
            Protocol::I2c => "i2c",
            Protocol::Can => "can",
            Protocol::Lin => "lin",
        }
    }

    /// Whether [`ProtocolDecoder::decode`] produces frames for this protocol.
    pub fn is_supported(self) -> bool {
        matches!(self, Protocol::Uart | Protocol::Spi | Protocol::I2c)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Protocol::None),
            "uart" | "serial" => Ok(Protocol::Uart),
            "spi" => Ok(Protocol::Spi),
            "i2c" | "iic" => Ok(Protocol::I2c),
            "can" => Ok(Protocol::Can),
            "lin" => Ok(Protocol::Lin),
            _ => Err(ParseEnumError::new("protocol", s)),
        }
    }
}

/// What a decoded frame represents on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrameKind {
    /// I2C START or repeated START condition
    Start,
    /// I2C STOP condition
    Stop,
    /// I2C address byte(s)
    Address,
    /// A data byte or word
    Data,
    /// Acknowledge bit (SDA low)
    Ack,
    /// Not-acknowledge bit (SDA high)
    Nak,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FrameKind::Start => "START",
            FrameKind::Stop => "STOP",
            FrameKind::Address => "ADDRESS",
            FrameKind::Data => "DATA",
            FrameKind::Ack => "ACK",
            FrameKind::Nak => "NAK",
        })
    }
}

/// Error detected while decoding a UART frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum FrameError {
    /// Parity bit did not match the data bits
    #[error("parity error")]
    Parity,
    /// A stop bit was not at the idle level
    #[error("framing error")]
    Framing,
    /// Both of the above
    #[error("framing/parity error")]
    ParityAndFraming,
}

impl FrameError {
    fn from_flags(parity: bool, framing: bool) -> Option<Self> {
        match (parity, framing) {
            (false, false) => None,
            (true, false) => Some(FrameError::Parity),
            (false, true) => Some(FrameError::Framing),
            (true, true) => Some(FrameError::ParityAndFraming),
        }
    }
}

/// One decoded bus event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedFrame {
    /// Start time in seconds
    pub start_time: f64,
    /// End time in seconds
    pub end_time: f64,
    /// Frame kind
    pub kind: FrameKind,
    /// Payload bytes
    pub data: Vec<u8>,
    /// Human-readable summary
    pub description: String,
    /// Decode error, if any
    pub error: Option<FrameError>,
}

impl DecodedFrame {
    fn new(kind: FrameKind, start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
            kind,
            data: Vec::new(),
            description: String::new(),
            error: None,
        }
    }

    fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the frame carries a decode error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Error message, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.map(|e| e.to_string())
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// UART parity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    /// No parity bit
    #[default]
    None,
    /// Odd number of ones including the parity bit
    Odd,
    /// Even number of ones including the parity bit
    Even,
}

impl Parity {
    /// Number of parity bits in a frame.
    pub fn bits(self) -> u32 {
        u32::from(self != Parity::None)
    }

    /// Parity bit value that completes `ones` data ones.
    pub fn bit_for(self, ones: u32) -> bool {
        match self {
            Parity::None => false,
            Parity::Odd => ones % 2 == 0,
            Parity::Even => ones % 2 == 1,
        }
    }

    /// Whether `ones` (data plus parity bit) satisfies the mode.
    pub fn is_satisfied(self, ones: u32) -> bool {
        match self {
            Parity::None => true,
            Parity::Odd => ones % 2 == 1,
            Parity::Even => ones % 2 == 0,
        }
    }
}

impl FromStr for Parity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "n" => Ok(Parity::None),
            "odd" | "o" => Ok(Parity::Odd),
            "even" | "e" => Ok(Parity::Even),
            _ => Err(ParseEnumError::new("parity", s)),
        }
    }
}

/// Fewest UART data bits decoded.
pub const MIN_UART_DATA_BITS: u8 = 5;
/// Most UART data bits decoded.
pub const MAX_UART_DATA_BITS: u8 = 9;

/// UART line settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UartConfig {
    /// Bits per second
    pub baud_rate: u32,
    /// Data bits per frame (5..=9)
    pub data_bits: u8,
    /// Stop bits per frame
    pub stop_bits: u8,
    /// Parity mode
    pub parity: Parity,
    /// Idle low instead of idle high
    pub inverted: bool,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
            inverted: false,
        }
    }
}

impl UartConfig {
    /// Duration of one bit in seconds, or 0 at zero baud.
    pub fn bit_period(&self) -> f64 {
        if self.baud_rate == 0 {
            return 0.0;
        }
        1.0 / f64::from(self.baud_rate)
    }

    /// Data bits actually decoded, `data_bits` clamped to 5..=9.
    pub fn word_bits(&self) -> u32 {
        u32::from(self.data_bits.clamp(MIN_UART_DATA_BITS, MAX_UART_DATA_BITS))
    }

    /// Stop bits actually checked; zero counts as one.
    pub fn stop_bit_count(&self) -> u32 {
        u32::from(self.stop_bits.max(1))
    }

    /// Bits in one frame, start bit included.
    pub fn frame_bits(&self) -> u32 {
        1 + self.word_bits() + self.parity.bits() + self.stop_bit_count()
    }
}

/// SPI bus settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiConfig {
    /// Clock polarity (0 = idle low, 1 = idle high)
    pub cpol: u8,
    /// Clock phase (0 = sample on leading edge, 1 = on trailing edge)
    pub cpha: u8,
    /// Most significant bit first
    pub msb_first: bool,
    /// Bits per word (1..=32)
    pub word_size: u8,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            cpol: 0,
            cpha: 0,
            msb_first: true,
            word_size: 8,
        }
    }
}

impl SpiConfig {
    /// Whether data is sampled on rising clock edges.
    ///
    /// Modes 0 (CPOL=0, CPHA=0) and 3 (CPOL=1, CPHA=1) sample on rising edges;
    /// modes 1 and 2 on falling edges.
    pub fn sample_on_rising(&self) -> bool {
        (self.cpol == 0) == (self.cpha == 0)
    }

    /// SPI mode number 0..=3.
    pub fn mode(&self) -> u8 {
        (u8::from(self.cpol != 0) << 1) | u8::from(self.cpha != 0)
    }

    /// Settings for SPI mode `mode` (0..=3), keeping bit order and word size.
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.cpol = (mode >> 1) & 1;
        self.cpha = mode & 1;
        self
    }
}

/// I2C bus settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct I2cConfig {
    /// Address width in bits (7 or 10)
    pub address_bits: u8,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self { address_bits: 7 }
    }
}

/// Default high threshold in volts.
pub const DEFAULT_HIGH_THRESHOLD: f64 = 2.5;

/// Default low threshold in volts.
pub const DEFAULT_LOW_THRESHOLD: f64 = 0.8;

/// Configurable decoder for UART, SPI and I2C.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolDecoder {
    protocol: Protocol,
    uart: UartConfig,
    spi: SpiConfig,
    i2c: I2cConfig,
    high_threshold: f64,
    low_threshold: f64,
}

impl Default for ProtocolDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolDecoder {
    /// Decoder with no protocol selected, default line settings and
    /// 2.5 V / 0.8 V thresholds.
    pub fn new() -> Self {
        Self {
            protocol: Protocol::None,
            uart: UartConfig::default(),
            spi: SpiConfig::default(),
            i2c: I2cConfig::default(),
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            low_threshold: DEFAULT_LOW_THRESHOLD,
        }
    }

    /// Selected protocol.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Select the protocol used by [`decode`](Self::decode).
    pub fn set_protocol(&mut self, protocol: Protocol) {
        if self.protocol != protocol {
            tracing::debug!(from = %self.protocol, to = %protocol, "protocol changed");
            self.protocol = protocol;
        }
    }

    /// UART settings.
    pub fn uart(&self) -> &UartConfig {
        &self.uart
    }

    /// Mutable UART settings.
    pub fn uart_mut(&mut self) -> &mut UartConfig {
        &mut self.uart
    }

    /// Replace the UART settings.
    pub fn set_uart(&mut self, config: UartConfig) {
        self.uart = config;
    }

    /// SPI settings.
    pub fn spi(&self) -> &SpiConfig {
        &self.spi
    }

    /// Mutable SPI settings.
    pub fn spi_mut(&mut self) -> &mut SpiConfig {
        &mut self.spi
    }

    /// Replace the SPI settings.
    pub fn set_spi(&mut self, config: SpiConfig) {
        self.spi = config;
    }

    /// I2C settings.
    pub fn i2c(&self) -> &I2cConfig {
        &self.i2c
    }

    /// Replace the I2C settings.
    pub fn set_i2c(&mut self, config: I2cConfig) {
        self.i2c = config;
    }

    /// High threshold in volts.
    pub fn high_threshold(&self) -> f64 {
        self.high_threshold
    }

    /// Low threshold in volts.
    pub fn low_threshold(&self) -> f64 {
        self.low_threshold
    }

    /// Set the high threshold.
    pub fn set_high_threshold(&mut self, volts: f64) {
        self.high_threshold = volts;
    }

    /// Set the low threshold.
    pub fn set_low_threshold(&mut self, volts: f64) {
        self.low_threshold = volts;
    }

    /// Binary decision level: midpoint of the threshold pair.
    pub fn threshold(&self) -> f64 {
        (self.high_threshold + self.low_threshold) / 2.0
    }

    /// Decode with the selected protocol.
    ///
    /// - UART decodes `data`.
    /// - I2C treats `data` as SDA and `clock` as SCL; without a clock the
    ///   result is empty.
    /// - SPI treats `data` as MOSI, `clock` as SCK and `cs` as active-low
    ///   chip select.
    ///
    /// Pass an empty slice for a line that is not connected. CAN, LIN and
    /// `None` produce no frames.
    pub fn decode(&self, data: &[Sample], clock: &[Sample], cs: &[Sample]) -> Vec<DecodedFrame> {
        let frames = match self.protocol {
            Protocol::Uart => self.decode_uart(data),
            Protocol::I2c if !clock.is_empty() => self.decode_i2c(data, clock),
            Protocol::I2c => {
                tracing::debug!("I2C decode needs an SCL line");
                Vec::new()
            }
            Protocol::Spi => self.decode_spi(data, &[], clock, cs),
            other => {
                tracing::debug!(protocol = %other, "no decoder for protocol");
                Vec::new()
            }
        };
        tracing::debug!(protocol = %self.protocol, frames = frames.len(), "decode complete");
        frames
    }

    /// Decode an asynchronous serial line.
    pub fn decode_uart(&self, data: &[Sample]) -> Vec<DecodedFrame> {
        uart::decode(data, &self.uart, self.threshold())
    }

    /// Decode an I2C bus from its SDA and SCL lines.
    pub fn decode_i2c(&self, sda: &[Sample], scl: &[Sample]) -> Vec<DecodedFrame> {
        i2c::decode(sda, scl, &self.i2c, self.threshold())
    }

    /// Decode an SPI bus. `mosi`, `miso` and `cs` may be empty.
    pub fn decode_spi(
        &self,
        mosi: &[Sample],
        miso: &[Sample],
        sck: &[Sample],
        cs: &[Sample],
    ) -> Vec<DecodedFrame> {
        spi::decode(mosi, miso, sck, cs, &self.spi, self.threshold())
    }
}

/// `"0x41 'A'"`, with `.` standing in for non-printable bytes.
pub(crate) fn describe_byte(byte: u8) -> String {
    let shown = if byte.is_ascii_graphic() || byte == b' ' {
        byte as char
    } else {
        '.'
    };
    format!("0x{byte:02X} '{shown}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_rules() {
        assert!(Parity::Odd.is_satisfied(3));
        assert!(!Parity::Odd.is_satisfied(4));
        assert!(Parity::Even.is_satisfied(4));
        assert!(Parity::Odd.bit_for(2));
        assert!(!Parity::Even.bit_for(2));
        assert_eq!(Parity::None.bits(), 0);
        assert_eq!(Parity::Even.bits(), 1);
    }

    #[test]
    fn spi_modes() {
        let base = SpiConfig::default();
        assert!(base.with_mode(0).sample_on_rising());
        assert!(!base.with_mode(1).sample_on_rising());
        assert!(!base.with_mode(2).sample_on_rising());
        assert!(base.with_mode(3).sample_on_rising());
        assert_eq!(base.with_mode(2).mode(), 2);
    }

    #[test]
    fn uart_frame_geometry() {
        let cfg = UartConfig {
            parity: Parity::Even,
            stop_bits: 2,
            ..UartConfig::default()
        };
        assert_eq!(cfg.frame_bits(), 12);
        assert!((cfg.bit_period() - 1.0 / 9600.0).abs() < 1e-15);
        let zero = UartConfig {
            baud_rate: 0,
            ..UartConfig::default()
        };
        assert_eq!(zero.bit_period(), 0.0);
    }

    #[test]
    fn uart_out_of_range_bits_are_clamped() {
        let wide = UartConfig {
            data_bits: 17,
            stop_bits: 0,
            ..UartConfig::default()
        };
        assert_eq!(wide.word_bits(), 9);
        assert_eq!(wide.stop_bit_count(), 1);
        assert_eq!(wide.frame_bits(), 11);

        let narrow = UartConfig {
            data_bits: 0,
            ..UartConfig::default()
        };
        assert_eq!(narrow.word_bits(), 5);
        assert_eq!(narrow.frame_bits(), 7);
    }

    #[test]
    fn threshold_is_midpoint() {
        let mut d = ProtocolDecoder::new();
        assert!((d.threshold() - 1.65).abs() < 1e-12);
        d.set_high_threshold(3.0);
        d.set_low_threshold(1.0);
        assert_eq!(d.threshold(), 2.0);
    }

    #[test]
    fn unsupported_protocols_decode_nothing() {
        let line = vec![Sample::new(0.0, 3.3), Sample::new(1.0, 0.0)];
        let mut d = ProtocolDecoder::new();
        for p in [Protocol::None, Protocol::Can, Protocol::Lin] {
            d.set_protocol(p);
            assert!(d.decode(&line, &line, &[]).is_empty());
        }
        d.set_protocol(Protocol::I2c);
        assert!(d.decode(&line, &[], &[]).is_empty());
    }

    #[test]
    fn byte_descriptions() {
        assert_eq!(describe_byte(b'A'), "0x41 'A'");
        assert_eq!(describe_byte(0x0A), "0x0A '.'");
        assert_eq!(FrameKind::Nak.to_string(), "NAK");
        assert_eq!(FrameError::ParityAndFraming.to_string(), "framing/parity error");
    }

    #[test]
    fn protocol_parse() {
        assert_eq!("I2C".parse::<Protocol>().unwrap(), Protocol::I2c);
        assert!("usb".parse::<Protocol>().is_err());
        assert!(!Protocol::Can.is_supported());
    }
}

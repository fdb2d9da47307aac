//! Integration tests for scopekit-analysis crate.
//!
//! Tests exercise the public API of the spectrum analyzer, protocol decoder
//! and measurement engine using synthetic signals with known properties.

use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;

use scopekit_analysis::signal::{self, I2cBus, Noise, render_i2c, render_spi, render_uart};
use scopekit_analysis::{
    FrameError, FrameKind, MeasurementEngine, MeasurementKind, Protocol, ProtocolDecoder,
    ScaleType, SpectrumAnalyzer, SpiConfig, UartConfig, WindowFunction, calculate_sfdr,
    calculate_snr, calculate_thd, find_peaks,
};
use scopekit_core::{Channel, ChannelKind, Probe, Sample, stream};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn analyzer(window: WindowFunction, scale: ScaleType, fft_size: usize) -> SpectrumAnalyzer {
    let mut a = SpectrumAnalyzer::new();
    a.set_window(window);
    a.set_scale(scale);
    a.set_fft_size(fft_size);
    a
}

fn analog(name: &str, samples: Vec<Sample>) -> Channel {
    Channel::new(name, ChannelKind::Analog)
        .with_probe(Probe::X1)
        .with_enabled(true)
        .with_samples(samples)
}

// ===========================================================================
// 1. Spectrum analyzer
// ===========================================================================

#[test]
fn bin_centred_sine_reads_its_amplitude() {
    let fft_size = 1024;
    let fs = 1024.0;
    let amplitude = 0.75;
    let tone = signal::sine(fft_size, fs, 100.0, amplitude, 0.0, 0.0);

    let mut a = analyzer(WindowFunction::Rectangle, ScaleType::Linear, fft_size);
    let spectrum = a.compute(&tone, fs);
    assert_eq!(spectrum.len(), fft_size / 2);
    assert_eq!(spectrum.frequencies.len(), spectrum.magnitudes.len());

    let peaks = spectrum.find_peaks(1, 0.1);
    assert_eq!(peaks.len(), 1);
    assert!((peaks[0].frequency - 100.0).abs() <= spectrum.bin_width());
    assert!(
        (peaks[0].magnitude - amplitude).abs() < 0.05 * amplitude,
        "magnitude {}",
        peaks[0].magnitude
    );
}

#[test]
fn off_bin_sine_within_five_percent_with_flattop() {
    let fft_size = 4096;
    let fs = 48_000.0;
    let tone = signal::sine(fft_size, fs, 1234.5, 1.0, 0.0, 0.0);

    let mut a = analyzer(WindowFunction::FlatTop, ScaleType::Linear, fft_size);
    let spectrum = a.compute(&tone, fs);
    let peak = spectrum.find_peaks(1, 0.1)[0];
    assert!((peak.frequency - 1234.5).abs() <= spectrum.bin_width());
    assert!((peak.magnitude - 1.0).abs() < 0.05, "magnitude {}", peak.magnitude);
}

#[test]
fn kilohertz_tone_with_noise_floor() {
    let fs = 1_000_000.0;
    let mut input = signal::sine(4096, fs, 1000.0, 1.0, 0.0, 0.0);
    Noise::new(7).add_to(&mut input, 0.01);

    let mut a = SpectrumAnalyzer::new();
    assert_eq!(a.fft_size(), 4096);
    assert_eq!(a.window(), WindowFunction::Hanning);
    assert_eq!(a.scale(), ScaleType::Logarithmic);

    let spectrum = a.compute(&input, fs);
    let peaks = spectrum.find_peaks(1, -60.0);
    assert_eq!(peaks.len(), 1);
    assert!((peaks[0].frequency - 1000.0).abs() <= spectrum.bin_width());
    assert!(peaks[0].magnitude.abs() < 1.0, "peak {} dB", peaks[0].magnitude);
}

#[test]
fn single_bin_peak_needs_no_interpolation() {
    let mut spectrum = vec![-120.0; 256];
    spectrum[40] = -3.0;
    let peaks = find_peaks(&spectrum, 51_200.0, 4, -100.0);
    assert_eq!(peaks.len(), 1);
    assert_eq!(peaks[0].bin, 40);
    assert!((peaks[0].frequency - 4000.0).abs() < 1e-9);
    assert!((peaks[0].magnitude + 3.0).abs() < 1e-9);
}

#[test]
fn metrics_out_of_range_return_zero() {
    let spectrum = vec![-80.0; 128];
    let fs = 25_600.0; // 100 Hz bins
    for f in [0.0, 12_800.0, 50_000.0] {
        assert_eq!(calculate_thd(&spectrum, f, fs, 5), 0.0);
        assert_eq!(calculate_sfdr(&spectrum, f, fs), 0.0);
        assert_eq!(calculate_snr(&spectrum, f, fs, 0.0), 0.0);
    }
}

#[test]
fn distortion_metrics_of_tone_with_third_harmonic() {
    let fs = 1_024_000.0;
    let fft_size = 4096;
    // 1 kHz bin-centred fundamental with a 1% third harmonic
    let mut tone = signal::sine(fft_size, fs, 1000.0, 1.0, 0.0, 0.0);
    for (v, h) in tone
        .iter_mut()
        .zip(signal::sine(fft_size, fs, 3000.0, 0.01, 0.0, 0.0))
    {
        *v += h;
    }

    let mut a = analyzer(WindowFunction::Hanning, ScaleType::Logarithmic, fft_size);
    let spectrum = a.compute(&tone, fs);
    let thd = spectrum.thd(1000.0, 5);
    assert!((thd - 1.0).abs() < 0.1, "THD {thd}%");

    let sfdr = spectrum.sfdr(1000.0);
    assert!((sfdr - 40.0).abs() < 1.0, "SFDR {sfdr} dB");
}

#[test]
fn averaging_resets_on_size_change() {
    let fs = 8192.0;
    let tone = signal::sine(2048, fs, 512.0, 1.0, 0.0, 0.0);

    let mut a = analyzer(WindowFunction::Hanning, ScaleType::Linear, 1024);
    a.set_averaging(4);
    for _ in 0..6 {
        a.compute(&tone, fs);
    }
    assert_eq!(a.averaged_frames(), 4);

    a.set_fft_size(2048);
    assert_eq!(a.averaged_frames(), 0);
    a.set_fft_size(2048);
    a.compute(&tone, fs);
    assert_eq!(a.averaged_frames(), 1);
}

#[test]
fn short_input_gives_empty_spectrum() {
    let mut a = SpectrumAnalyzer::new();
    let spectrum = a.compute(&[0.0; 100], 1000.0);
    assert!(spectrum.is_empty());
    assert!(spectrum.find_peaks(5, -100.0).is_empty());
    assert!(a.last_spectrum().is_none());
}

#[test]
fn stream_input_derives_sample_rate() {
    let fs = 10_000.0;
    let volts = signal::sine(1024, fs, 625.0, 1.0, 0.0, 0.0);
    let samples = stream::from_voltages(&volts, fs, 0.0);

    let mut a = analyzer(WindowFunction::Rectangle, ScaleType::Linear, 1024);
    let spectrum = a.compute_stream(&samples);
    assert!((spectrum.sample_rate - fs).abs() < 1e-3);
    let peak = spectrum.find_peaks(1, 0.1)[0];
    assert_eq!(peak.bin, 64);
}

// ===========================================================================
// 2. Protocol decoder
// ===========================================================================

#[test]
fn uart_roundtrip_across_framings() {
    let configs = [
        UartConfig::default(),
        UartConfig {
            baud_rate: 115_200,
            data_bits: 7,
            parity: "even".parse().unwrap(),
            stop_bits: 2,
            ..UartConfig::default()
        },
        UartConfig {
            baud_rate: 19_200,
            parity: "odd".parse().unwrap(),
            inverted: true,
            ..UartConfig::default()
        },
    ];
    let message = b"Scope!";

    for config in configs {
        let mask = ((1u16 << config.data_bits) - 1) as u8;
        let line = render_uart(message, &config, 16, 3.3);

        let mut decoder = ProtocolDecoder::new();
        decoder.set_protocol(Protocol::Uart);
        decoder.set_uart(config);
        let frames = decoder.decode(&line, &[], &[]);

        let bytes: Vec<u8> = frames.iter().map(|f| f.data[0]).collect();
        let expected: Vec<u8> = message.iter().map(|b| b & mask).collect();
        assert_eq!(bytes, expected, "{config:?}");
        assert!(frames.iter().all(|f| !f.is_error()), "{config:?}");
        assert!(frames.iter().all(|f| f.kind == FrameKind::Data));
    }
}

#[test]
fn uart_broken_stop_bit_sets_error() {
    let config = UartConfig::default();
    let spb = 20;
    let mut line = render_uart(b"AB", &config, spb, 3.3);

    // First start bit begins after two idle bits; the stop bit is bit 9.
    let stop_start = 2 * spb + 9 * spb;
    for s in &mut line[stop_start + 5..stop_start + 15] {
        s.voltage = 0.0;
    }

    let decoder = ProtocolDecoder::new();
    let frames = decoder.decode_uart(&line);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].data, vec![b'A']);
    assert_eq!(frames[0].error, Some(FrameError::Framing));
    assert_eq!(frames[0].error_message().as_deref(), Some("framing error"));
    assert_eq!(frames[1].data, vec![b'B']);
    assert!(!frames[1].is_error());
}

#[test]
fn i2c_write_transaction_frames() {
    let bus = I2cBus::new(5).start().address(0x50, false).byte(0xA5).stop();
    let (sda, scl) = render_i2c(&bus, 1e-6, 3.3);

    let mut decoder = ProtocolDecoder::new();
    decoder.set_protocol(Protocol::I2c);
    let frames = decoder.decode(&sda, &scl, &[]);

    let kinds: Vec<FrameKind> = frames.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FrameKind::Start,
            FrameKind::Address,
            FrameKind::Ack,
            FrameKind::Data,
            FrameKind::Ack,
            FrameKind::Stop,
        ]
    );
    assert_eq!(frames[1].description, "Addr: 0x50 WRITE");
    assert_eq!(frames[3].data, vec![0xA5]);
    assert!(frames.windows(2).all(|w| w[0].start_time <= w[1].start_time));
}

#[test]
fn i2c_without_clock_is_empty() {
    let bus = I2cBus::new(5).start().address(0x50, false).stop();
    let (sda, _) = render_i2c(&bus, 1e-6, 3.3);
    let mut decoder = ProtocolDecoder::new();
    decoder.set_protocol(Protocol::I2c);
    assert!(decoder.decode(&sda, &[], &[]).is_empty());
}

#[test]
fn spi_through_dispatch_uses_data_as_mosi() {
    for mode in 0..4 {
        let config = SpiConfig::default().with_mode(mode);
        let lines = render_spi(b"\x12\x34", &[], &config, 4, 1e-6, 3.3);

        let mut decoder = ProtocolDecoder::new();
        decoder.set_protocol(Protocol::Spi);
        decoder.set_spi(config);
        let frames = decoder.decode(&lines.mosi, &lines.sck, &lines.cs);

        let mosi: Vec<u8> = frames.iter().map(|f| f.data[0]).collect();
        assert_eq!(mosi, vec![0x12, 0x34], "mode {mode}");
    }
}

#[test]
fn unsupported_protocols_decode_nothing() {
    let line = render_uart(b"x", &UartConfig::default(), 8, 3.3);
    let mut decoder = ProtocolDecoder::new();
    for protocol in [Protocol::None, Protocol::Can, Protocol::Lin] {
        decoder.set_protocol(protocol);
        assert!(decoder.decode(&line, &line, &[]).is_empty());
    }
}

// ===========================================================================
// 3. Measurement engine
// ===========================================================================

#[test]
fn engine_over_channel_map() {
    let fs = 100_000.0;
    let mut channels: HashMap<String, Channel> = HashMap::new();
    channels.insert(
        "CH1".into(),
        analog(
            "CH1",
            stream::from_voltages(&signal::square(2000, fs, 1000.0, 0.0, 3.3, 0.25), fs, 0.0),
        ),
    );
    channels.insert(
        "CH2".into(),
        analog(
            "CH2",
            stream::from_voltages(&signal::sine(2000, fs, 1000.0, 1.0, -0.1, 0.0), fs, 0.0),
        ),
    );
    channels.insert(
        "CH3".into(),
        analog(
            "CH3",
            stream::from_voltages(&signal::sine(2000, fs, 1000.0, 1.0, -0.1 - FRAC_PI_2, 0.0), fs, 0.0),
        ),
    );

    let mut engine = MeasurementEngine::new();
    engine.enable_statistics(true);
    let freq = engine.add_measurement(MeasurementKind::Frequency, "CH1");
    let vpp = engine.add_measurement(MeasurementKind::Vpp, "CH1");
    let duty = engine.add_measurement(MeasurementKind::PositiveDutyCycle, "CH1");
    let phase = engine.add_phase_measurement(MeasurementKind::Phase, "CH2", "CH3");

    for _ in 0..3 {
        engine.update_measurements(&channels);
    }

    let f = engine.measurement(freq).unwrap();
    assert!((f.value - 1000.0).abs() < 5.0, "freq {}", f.value);
    assert!(f.display_value().ends_with(" kHz"));

    let v = engine.measurement(vpp).unwrap();
    assert_eq!(v.display_value(), "3.300 V");

    let d = engine.measurement(duty).unwrap();
    assert!((d.value - 25.0).abs() < 2.0, "duty {}", d.value);

    let p = engine.measurement(phase).unwrap();
    assert!((p.value - 90.0).abs() < 1.0, "phase {}", p.value);

    let stats = engine.statistics(vpp).unwrap();
    assert_eq!(stats.count, 3);
    assert_eq!(stats.std_dev, 0.0);
    assert_eq!(stats.mean, stats.current);
}

#[test]
fn removed_measurement_drops_statistics() {
    let mut engine = MeasurementEngine::new();
    let id = engine.add_measurement(MeasurementKind::Vrms, "CH1");
    assert!(engine.statistics(id).is_some());
    assert!(engine.remove_measurement(id));
    assert!(engine.statistics(id).is_none());
    assert!(engine.measurement(id).is_none());
}

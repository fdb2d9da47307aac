//! Integration tests for scopekit-cli.
//!
//! Each test generates a waveform with `scopekit generate`, then runs the
//! analysis subcommands on the resulting CSV through the built binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Helper to get the path to the `scopekit` binary built by cargo.
fn scopekit_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_scopekit"))
}

fn run(args: &[&str]) -> Output {
    scopekit_bin()
        .args(args)
        .output()
        .expect("failed to run scopekit")
}

fn run_ok(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "scopekit {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn json(args: &[&str]) -> serde_json::Value {
    serde_json::from_str(&run_ok(args)).expect("stdout is not JSON")
}

fn generate(dir: &Path, name: &str, args: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let path_str = path.to_str().unwrap();
    let mut full = vec!["generate", args[0], path_str];
    full.extend_from_slice(&args[1..]);
    run_ok(&full);
    assert!(path.exists(), "{} was not written", path.display());
    path
}

// ---------------------------------------------------------------------------
// CLI basics
// ---------------------------------------------------------------------------

#[test]
fn cli_help_lists_subcommands() {
    let stdout = run_ok(&["--help"]);
    for command in ["spectrum", "decode", "measure", "generate", "config"] {
        assert!(stdout.contains(command), "help should mention '{command}'");
    }
}

#[test]
fn cli_rejects_unknown_window() {
    let output = run(&["spectrum", "missing.csv", "--window", "triangle"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("triangle"));
}

// ---------------------------------------------------------------------------
// Spectrum
// ---------------------------------------------------------------------------

#[test]
fn spectrum_finds_generated_tone() {
    let dir = TempDir::new().unwrap();
    let path = generate(
        dir.path(),
        "sine.csv",
        &["sine", "--freq", "1000", "--samples", "8192", "--sample-rate", "100000"],
    );

    let report = json(&[
        "spectrum",
        path.to_str().unwrap(),
        "--fft-size",
        "4096",
        "--peaks",
        "3",
        "--thd",
        "1000",
        "--json",
    ]);

    assert_eq!(report["fft_size"], 4096);
    let top = report["peaks"][0]["frequency"].as_f64().unwrap();
    assert!((top - 1000.0).abs() < 25.0, "peak at {top}");
    let thd = report["thd_percent"].as_f64().unwrap();
    assert!(thd < 1.0, "THD {thd}");
}

#[test]
fn spectrum_averaging_and_csv_output() {
    let dir = TempDir::new().unwrap();
    let path = generate(
        dir.path(),
        "noisy.csv",
        &["sine", "--samples", "16384", "--noise", "0.1"],
    );
    let out = dir.path().join("spectrum.csv");

    let report = json(&[
        "spectrum",
        path.to_str().unwrap(),
        "--fft-size",
        "2048",
        "--averaging",
        "4",
        "--output",
        out.to_str().unwrap(),
        "--json",
    ]);
    assert!(report["frames"].as_u64().unwrap() > 1);

    let csv = std::fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("frequency_hz,magnitude"));
    assert_eq!(csv.lines().count(), 1 + 1024);
}

#[test]
fn spectrum_too_short_capture_fails() {
    let dir = TempDir::new().unwrap();
    let path = generate(dir.path(), "short.csv", &["sine", "--samples", "100"]);
    let output = run(&["spectrum", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("fewer than the FFT size"));
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

#[test]
fn decode_generated_uart() {
    let dir = TempDir::new().unwrap();
    let path = generate(dir.path(), "uart.csv", &["uart", "--text", "Hi!", "--baud", "115200"]);

    let stdout = run_ok(&["decode", "uart", path.to_str().unwrap(), "--baud", "115200"]);
    assert!(stdout.contains("0x48 'H'"));
    assert!(stdout.contains("0x69 'i'"));
    assert!(stdout.contains("0x21 '!'"));
    assert!(stdout.contains("3 frame(s), 0 error(s)"));
}

#[test]
fn decode_uart_with_estimated_baud() {
    let dir = TempDir::new().unwrap();
    let path = generate(dir.path(), "uart.csv", &["uart", "--text", "UUUU", "--baud", "19200"]);

    let frames = json(&["decode", "uart", path.to_str().unwrap(), "--baud", "auto", "--json"]);
    let frames = frames.as_array().unwrap();
    assert_eq!(frames.len(), 4);
    for frame in frames {
        assert_eq!(frame["data"][0], 0x55);
        assert!(frame["error"].is_null());
    }
}

#[test]
fn decode_uart_clamps_oversized_word() {
    let dir = TempDir::new().unwrap();
    let path = generate(dir.path(), "uart.csv", &["uart", "--text", "A", "--baud", "9600"]);

    // 17 data bits decode as 9: the stop bit becomes bit 8
    let stdout = run_ok(&[
        "decode",
        "uart",
        path.to_str().unwrap(),
        "--baud",
        "9600",
        "--data-bits",
        "17",
    ]);
    assert!(stdout.contains("0x141"), "got: {stdout}");
    assert!(stdout.contains("1 frame(s), 0 error(s)"));
}

#[test]
fn decode_generated_i2c() {
    let dir = TempDir::new().unwrap();
    let path = generate(dir.path(), "i2c.csv", &["i2c", "--address", "0x3C", "--text", "ok"]);

    let stdout = run_ok(&["decode", "i2c", path.to_str().unwrap()]);
    assert!(stdout.contains("Addr: 0x3C WRITE"));
    assert!(stdout.contains("0x6F 'o'"));
    assert!(stdout.contains("0x6B 'k'"));
    assert!(stdout.contains("STOP"));
}

#[test]
fn decode_i2c_without_clock_column_fails() {
    let dir = TempDir::new().unwrap();
    let path = generate(dir.path(), "uart.csv", &["uart"]);

    let output = run(&["decode", "i2c", path.to_str().unwrap(), "--sda", "TX"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("'SCL' not found"));
}

#[test]
fn decode_generated_spi_mode_3() {
    let dir = TempDir::new().unwrap();
    let path = generate(
        dir.path(),
        "spi.csv",
        &["spi", "--mosi", "AB", "--miso", "xy", "--mode", "3"],
    );

    let stdout = run_ok(&[
        "decode",
        "spi",
        path.to_str().unwrap(),
        "--miso",
        "MISO",
        "--cs",
        "CS",
        "--mode",
        "3",
    ]);
    assert!(stdout.contains("MOSI: 0x41 MISO: 0x78"));
    assert!(stdout.contains("MOSI: 0x42 MISO: 0x79"));
    assert!(stdout.contains("2 frame(s)"));
}

// ---------------------------------------------------------------------------
// Measure
// ---------------------------------------------------------------------------

#[test]
fn measure_square_wave() {
    let dir = TempDir::new().unwrap();
    let path = generate(dir.path(), "square.csv", &["square", "--duty", "0.25"]);

    let report = json(&[
        "measure",
        path.to_str().unwrap(),
        "--kind",
        "vpp,freq,positive_duty_cycle",
        "--json",
    ]);
    let values: Vec<f64> = report
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["value"].as_f64().unwrap())
        .collect();
    assert!((values[0] - 3.3).abs() < 1e-9);
    assert!((values[1] - 1000.0).abs() < 1.0, "freq {}", values[1]);
    assert!((values[2] - 25.0).abs() < 1.0, "duty {}", values[2]);
}

#[test]
fn measure_phase_between_channels() {
    let dir = TempDir::new().unwrap();
    let path = generate(dir.path(), "pair.csv", &["sine", "--phase", "-10", "--lag", "90"]);

    let report = json(&[
        "measure",
        path.to_str().unwrap(),
        "--kind",
        "phase",
        "--channel",
        "CH1",
        "--reference",
        "CH2",
        "--json",
    ]);
    let phase = &report[0];
    assert_eq!(phase["secondary"], "CH2");
    let value = phase["value"].as_f64().unwrap();
    assert!((value - 90.0).abs() < 2.0, "phase {value}");
}

#[test]
fn measure_phase_needs_reference() {
    let dir = TempDir::new().unwrap();
    let path = generate(dir.path(), "sine.csv", &["sine"]);
    let output = run(&["measure", path.to_str().unwrap(), "--kind", "phase"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--reference"));
}

#[test]
fn measure_statistics_over_passes() {
    let dir = TempDir::new().unwrap();
    let path = generate(dir.path(), "square.csv", &["square"]);

    let report = json(&[
        "measure",
        path.to_str().unwrap(),
        "--kind",
        "vpp",
        "--passes",
        "4",
        "--json",
    ]);
    let stats = &report[0]["statistics"];
    assert_eq!(stats["count"], 4);
    assert!((stats["mean"].as_f64().unwrap() - 3.3).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[test]
fn config_init_check_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("scopekit.toml");
    let path_str = path.to_str().unwrap();

    run_ok(&["config", "init", path_str]);
    assert!(path.exists());

    let again = run(&["config", "init", path_str]);
    assert!(!again.status.success(), "init must not overwrite without --force");
    run_ok(&["config", "init", path_str, "--force"]);

    let check = run_ok(&["config", "check", path_str]);
    assert!(check.contains("OK (2 measurement(s), 0 note(s))"));

    let show = run_ok(&["config", "show", path_str]);
    assert!(show.contains("[spectrum]"));
    assert!(show.contains("[[measurements.items]]"));
}

#[test]
fn config_check_reports_bad_measurement() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        "[spectrum]\nfft_size = 1000\n\n[[measurements.items]]\nkind = \"delay\"\nchannel = \"CH1\"\n",
    )
    .unwrap();

    let output = run(&["config", "check", path.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("needs a secondary channel"), "{stderr}");
}

#[test]
fn measure_uses_config_items() {
    let dir = TempDir::new().unwrap();
    let capture = generate(dir.path(), "square.csv", &["square"]);
    let config = dir.path().join("scope.toml");
    std::fs::write(
        &config,
        "[measurements]\nstatistics = false\n[[measurements.items]]\nkind = \"period\"\nchannel = \"CH1\"\n",
    )
    .unwrap();

    let report = json(&[
        "measure",
        capture.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--json",
    ]);
    let items = report.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["kind"], "period");
    let period = items[0]["value"].as_f64().unwrap();
    assert!((period - 1e-3).abs() < 1e-6, "period {period}");
}

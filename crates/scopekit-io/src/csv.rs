//! `time,CH1,CH2,...` text captures.
//!
//! The first column is time in seconds; every further column is one
//! channel in volts. A header row is optional: when the first row does not
//! start with a number its fields name the channels, otherwise channels are
//! named `CH1`, `CH2`, ... Blank lines and lines starting with `#` are
//! skipped. Fields may be separated by commas, semicolons or tabs.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use scopekit_core::Sample;

use crate::capture::{Capture, NamedStream};
use crate::{Error, Result};

fn split_fields(line: &str) -> Vec<&str> {
    line.split([',', ';', '\t']).map(str::trim).collect()
}

fn csv_error(line: usize, message: impl Into<String>) -> Error {
    Error::Csv {
        line,
        message: message.into(),
    }
}

/// Read a CSV capture file.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Capture> {
    let file = File::open(path.as_ref())?;
    parse_csv(BufReader::new(file))
}

/// Parse a CSV capture from any reader.
pub fn parse_csv(reader: impl BufRead) -> Result<Capture> {
    let mut columns: Vec<NamedStream> = Vec::new();
    let mut last_time = f64::NEG_INFINITY;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields = split_fields(trimmed);

        if columns.is_empty() {
            if fields.len() < 2 {
                return Err(csv_error(number, "need a time column and at least one channel"));
            }
            let is_header = fields[0].parse::<f64>().is_err();
            columns = fields[1..]
                .iter()
                .enumerate()
                .map(|(i, name)| NamedStream {
                    name: if is_header && !name.is_empty() {
                        (*name).to_string()
                    } else {
                        format!("CH{}", i + 1)
                    },
                    samples: Vec::new(),
                })
                .collect();
            if is_header {
                continue;
            }
        }

        if fields.len() != columns.len() + 1 {
            return Err(csv_error(
                number,
                format!("expected {} fields, found {}", columns.len() + 1, fields.len()),
            ));
        }

        let parse = |field: &str| {
            field
                .parse::<f64>()
                .map_err(|_| csv_error(number, format!("invalid number '{field}'")))
        };

        let time = parse(fields[0])?;
        if time < last_time {
            return Err(csv_error(number, format!("time {time} is before {last_time}")));
        }
        last_time = time;

        for (column, field) in columns.iter_mut().zip(&fields[1..]) {
            column.samples.push(Sample::new(time, parse(field)?));
        }
    }

    Ok(Capture { columns })
}

/// Write a capture as CSV with a header row.
///
/// Times come from the first column; every column must have the same
/// number of samples.
pub fn write_csv(path: impl AsRef<Path>, capture: &Capture) -> Result<()> {
    let Some(first) = capture.first() else {
        return Err(Error::Empty(path.as_ref().to_path_buf()));
    };
    let expected = first.samples.len();
    if let Some(bad) = capture.columns.iter().find(|c| c.samples.len() != expected) {
        return Err(Error::LengthMismatch {
            name: bad.name.clone(),
            expected,
            found: bad.samples.len(),
        });
    }

    let mut out = BufWriter::new(File::create(path.as_ref())?);
    write!(out, "time")?;
    for column in &capture.columns {
        write!(out, ",{}", column.name)?;
    }
    writeln!(out)?;

    for (i, sample) in first.samples.iter().enumerate() {
        write!(out, "{}", sample.time)?;
        for column in &capture.columns {
            write!(out, ",{}", column.samples[i].voltage)?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    tracing::debug!(path = %path.as_ref().display(), rows = expected, "CSV written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_channels() {
        let text = "time,SDA,SCL\n0,3.3,3.3\n1e-6,0,3.3\n";
        let capture = parse_csv(text.as_bytes()).unwrap();
        assert_eq!(capture.names(), vec!["SDA", "SCL"]);
        assert_eq!(capture.columns[0].samples[1], Sample::new(1e-6, 0.0));
    }

    #[test]
    fn headerless_gets_default_names() {
        let text = "# exported\n\n0;1.5\n0.001;2.5\n";
        let capture = parse_csv(text.as_bytes()).unwrap();
        assert_eq!(capture.names(), vec!["CH1"]);
        assert_eq!(capture.columns[0].samples.len(), 2);
    }

    #[test]
    fn bad_number_reports_line() {
        let text = "time,v\n0,1\n0.1,abc\n";
        let err = parse_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Csv { line: 3, .. }), "{err}");
        assert_eq!(err.to_string(), "CSV line 3: invalid number 'abc'");
    }

    #[test]
    fn ragged_row_is_rejected() {
        let text = "0,1,2\n1,1\n";
        let err = parse_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Csv { line: 2, .. }));
    }

    #[test]
    fn unsorted_time_is_rejected() {
        let text = "0.2,1\n0.1,1\n";
        assert!(matches!(
            parse_csv(text.as_bytes()),
            Err(Error::Csv { line: 2, .. })
        ));
    }
}

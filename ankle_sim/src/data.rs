// ankle_sim/src/data.rs

//! Reads the excitation and external-state series from CSV files.
//!
//! Files carry no header. External channels hold `(time, value)` rows; the
//! excitation file may hold either a bare value or `(time, value)` per row.
//! Rows must already sit on the uniform grid the sample clock expects.

use ankle_core::prelude::{ExcitationSeries, ExternalSeries};
use ankle_core::sampler::ChannelSamples;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}, row {row}: expected {expected} column(s), found {found}")]
    MissingColumn {
        path: PathBuf,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{path}, row {row}: `{value}` is not a number")]
    Parse {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("{path} contains no samples")]
    Empty { path: PathBuf },
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source)
}

/// Parses every record into floats, checking the minimum column count.
fn parse_rows<R: Read>(
    source: R,
    path: &Path,
    min_columns: usize,
) -> Result<Vec<Vec<f64>>, DataError> {
    let mut rows = Vec::new();
    for (i, record) in reader(source).records().enumerate() {
        let row = i + 1;
        let record = record.map_err(|source| DataError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() < min_columns {
            return Err(DataError::MissingColumn {
                path: path.to_path_buf(),
                row,
                expected: min_columns,
                found: record.len(),
            });
        }
        let values = record
            .iter()
            .map(|field| {
                field.parse::<f64>().map_err(|_| DataError::Parse {
                    path: path.to_path_buf(),
                    row,
                    value: field.to_string(),
                })
            })
            .collect::<Result<Vec<f64>, DataError>>()?;
        rows.push(values);
    }
    if rows.is_empty() {
        return Err(DataError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(rows)
}

fn open(path: &Path) -> Result<std::fs::File, DataError> {
    std::fs::File::open(path).map_err(|e| DataError::Csv {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

/// Excitation values, one per row; the last column of each row is the value.
pub fn parse_excitation<R: Read>(source: R, path: &Path) -> Result<ExcitationSeries, DataError> {
    let rows = parse_rows(source, path, 1)?;
    // parse_rows guarantees at least one column per row.
    let values = rows.iter().filter_map(|row| row.last().copied()).collect();
    Ok(ExcitationSeries::new(values))
}

/// `(time, value)` samples of one external channel.
pub fn parse_channel<R: Read>(source: R, path: &Path) -> Result<ChannelSamples, DataError> {
    let rows = parse_rows(source, path, 2)?;
    Ok(rows.iter().map(|row| (row[0], row[1])).collect())
}

pub fn read_excitation(path: &Path) -> Result<ExcitationSeries, DataError> {
    let series = parse_excitation(open(path)?, path)?;
    debug!("Loaded {} excitation samples from {}", series.len(), path.display());
    Ok(series)
}

pub fn read_channel(path: &Path) -> Result<ChannelSamples, DataError> {
    parse_channel(open(path)?, path)
}

/// Reads the four external channels in order.
pub fn read_external(paths: &[PathBuf; 4]) -> Result<ExternalSeries, DataError> {
    let [c0, c1, c2, c3] = paths;
    let series = ExternalSeries::new([
        read_channel(c0)?,
        read_channel(c1)?,
        read_channel(c2)?,
        read_channel(c3)?,
    ]);
    info!(
        "Loaded external state: shortest channel has {} samples",
        series.min_len()
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn origin() -> PathBuf {
        PathBuf::from("inline.csv")
    }

    #[test]
    fn excitation_accepts_bare_values() {
        let series = parse_excitation("0.0\n0.25\n0.5\n".as_bytes(), &origin()).unwrap();
        assert_eq!(series.0, vec![0.0, 0.25, 0.5]);
    }

    #[test]
    fn excitation_takes_value_column_of_pairs() {
        let series = parse_excitation("0.000, 0.1\n0.001, 0.2\n".as_bytes(), &origin()).unwrap();
        assert_eq!(series.0, vec![0.1, 0.2]);
    }

    #[test]
    fn channel_keeps_time_and_value() {
        let samples = parse_channel("0.0,1.5\n1.0,-2.5\n\n".as_bytes(), &origin()).unwrap();
        assert_eq!(samples, vec![(0.0, 1.5), (1.0, -2.5)]);
    }

    #[test]
    fn channel_rows_need_two_columns() {
        match parse_channel("0.0,1.0\n2.0\n".as_bytes(), &origin()) {
            Err(DataError::MissingColumn { row: 2, found: 1, .. }) => {}
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_field_names_the_row() {
        let err = parse_channel("0.0,1.0\n1.0,abc\n".as_bytes(), &origin()).unwrap_err();
        assert!(matches!(err, DataError::Parse { row: 2, .. }));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(matches!(
            parse_excitation("".as_bytes(), &origin()),
            Err(DataError::Empty { .. })
        ));
    }

    #[test]
    fn reads_external_channels_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..4)
            .map(|i| {
                let path = dir.path().join(format!("x{}_ext.csv", i + 1));
                let mut file = std::fs::File::create(&path).unwrap();
                writeln!(file, "0.0,{}", i).unwrap();
                writeln!(file, "1.0,{}", i * 10).unwrap();
                path
            })
            .collect();
        let paths: [PathBuf; 4] = paths.try_into().unwrap();

        let external = read_external(&paths).unwrap();
        assert_eq!(external.min_len(), 2);
        assert_eq!(external.channels[3][1], (1.0, 30.0));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_excitation(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }
}

use crate::core::io::traits::MeasurementFile;
use crate::core::models::curve::Measurement;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required columns {missing:?}; available columns: {available:?}")]
    MissingColumns {
        missing: Vec<&'static str>,
        available: Vec<String>,
    },
}

/// Header names the table columns were matched from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvMetadata {
    pub temperature_column: String,
    pub f330_column: String,
    pub f350_column: String,
    /// Rows containing at least one cell that is not a number.
    pub unparsable_rows: usize,
}

/// Comma-separated measurement tables with `temperature`, `F330` and `F350` columns.
///
/// Header matching is case-insensitive: the first header containing `temp` (or `t(`)
/// is the temperature. For each wavelength an exact `330` / `f330` header wins over one
/// starting with `f330`, which wins over any other header containing `330`. Ratio
/// columns (mentioning `ratio`, or both wavelengths) never count as an intensity.
/// Other columns are ignored.
pub struct CsvTable;

struct ColumnMap {
    temperature: usize,
    f330: usize,
    f350: usize,
}

impl CsvTable {
    fn locate_columns(headers: &csv::StringRecord) -> Result<ColumnMap, TableError> {
        let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |pred: &dyn Fn(&str) -> bool| normalized.iter().position(|h| pred(h));

        let temperature = find(&|h| h.contains("temp") || h.contains("t("));
        let f330 = intensity_column(&normalized, "330");
        let f350 = intensity_column(&normalized, "350");

        match (temperature, f330, f350) {
            (Some(temperature), Some(f330), Some(f350)) => Ok(ColumnMap {
                temperature,
                f330,
                f350,
            }),
            _ => {
                let missing = [
                    ("temperature", temperature),
                    ("F330", f330),
                    ("F350", f350),
                ]
                .into_iter()
                .filter_map(|(name, idx)| idx.is_none().then_some(name))
                .collect();
                Err(TableError::MissingColumns {
                    missing,
                    available: headers.iter().map(str::to_string).collect(),
                })
            }
        }
    }

    fn parse_cell(record: &csv::StringRecord, index: usize) -> Option<f64> {
        record.get(index).and_then(|cell| cell.trim().parse::<f64>().ok())
    }
}

/// Best-ranked header naming the intensity at `wavelength`, earliest on ties.
fn intensity_column(normalized: &[String], wavelength: &str) -> Option<usize> {
    let prefixed = format!("f{wavelength}");
    normalized
        .iter()
        .enumerate()
        .filter(|(_, h)| h.contains(wavelength) && !is_ratio_header(h))
        .min_by_key(|&(i, h)| {
            let rank = if h == wavelength || *h == prefixed {
                0
            } else if h.starts_with(&prefixed) {
                1
            } else {
                2
            };
            (rank, i)
        })
        .map(|(i, _)| i)
}

fn is_ratio_header(header: &str) -> bool {
    header.contains("ratio") || (header.contains("330") && header.contains("350"))
}

impl MeasurementFile for CsvTable {
    type Metadata = CsvMetadata;
    type Error = TableError;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(Vec<Measurement>, Self::Metadata), Self::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let columns = Self::locate_columns(&headers)?;
        let mut metadata = CsvMetadata {
            temperature_column: headers[columns.temperature].to_string(),
            f330_column: headers[columns.f330].to_string(),
            f350_column: headers[columns.f350].to_string(),
            unparsable_rows: 0,
        };

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }
            let cells = [
                Self::parse_cell(&record, columns.temperature),
                Self::parse_cell(&record, columns.f330),
                Self::parse_cell(&record, columns.f350),
            ];
            if cells.iter().any(Option::is_none) {
                metadata.unparsable_rows += 1;
            }
            let [temperature, f330, f350] = cells.map(|c| c.unwrap_or(f64::NAN));
            rows.push(Measurement::new(temperature, f330, f350));
        }

        Ok((rows, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn read(content: &str) -> Result<(Vec<Measurement>, CsvMetadata), TableError> {
        CsvTable::read_from(&mut Cursor::new(content.as_bytes()))
    }

    #[test]
    fn reads_rows_with_canonical_headers() {
        let (rows, metadata) = read("temperature,F330,F350\n20.0,1000,800\n20.5,1001,801\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Measurement::new(20.0, 1000.0, 800.0));
        assert_eq!(metadata.temperature_column, "temperature");
        assert_eq!(metadata.unparsable_rows, 0);
    }

    #[test]
    fn matches_instrument_style_headers_in_any_order() {
        let (rows, metadata) =
            read("Ratio 350/330,F350 (nm),Time (s),Temp (C),F330 (nm)\n0.8,800,0,20,1000\n").unwrap();
        assert_eq!(rows, vec![Measurement::new(20.0, 1000.0, 800.0)]);
        assert_eq!(metadata.f350_column, "F350 (nm)");
    }

    #[test]
    fn prefixed_intensity_headers_win_over_other_mentions() {
        let (rows, metadata) =
            read("temperature,Smoothed 330 trace,F330,350/330,F350 raw\n20,5,1000,0.8,800\n").unwrap();
        assert_eq!(rows, vec![Measurement::new(20.0, 1000.0, 800.0)]);
        assert_eq!(metadata.f330_column, "F330");
        assert_eq!(metadata.f350_column, "F350 raw");
    }

    #[test]
    fn ratio_column_alone_does_not_satisfy_intensities() {
        match read("temperature,Ratio 350/330\n20,0.8\n") {
            Err(TableError::MissingColumns { missing, .. }) => {
                assert_eq!(missing, vec!["F330", "F350"]);
            }
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn unparsable_cells_become_non_finite_values() {
        let (rows, metadata) = read("temperature,F330,F350\n20,1000,800\n21,n/a,801\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].f330.is_nan());
        assert_eq!(metadata.unparsable_rows, 1);
    }

    #[test]
    fn missing_columns_are_reported_by_name() {
        let result = read("temperature,F330\n20,1000\n");
        match result {
            Err(TableError::MissingColumns { missing, available }) => {
                assert_eq!(missing, vec!["F350"]);
                assert_eq!(available, vec!["temperature".to_string(), "F330".to_string()]);
            }
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn read_from_path_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = CsvTable::read_from_path(dir.path().join("absent.csv"));
        assert!(matches!(result, Err(TableError::Io(_))));
    }

    #[test]
    fn read_from_path_reads_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        fs::write(&path, "temperature,F330,F350\n20,1000,800\n21,1000,810\n").unwrap();
        let (rows, _) = CsvTable::read_from_path(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].f350, 810.0);
    }
}

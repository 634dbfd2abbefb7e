use std::path::Path;

use crate::data::constants::{FEATURE_NAMES, NUM_COLUMNS, NUM_FEATURES};
use crate::error::{Result, TunerError};

/// A labelled feature table in column-major layout.
///
/// Labels are always 0.0 or 1.0. Every feature column has one value per label.
#[derive(Debug, Clone)]
pub struct Dataset {
    labels: Vec<f64>,
    columns: Vec<Vec<f64>>,
}

impl Dataset {
    /// Build a dataset from row-major feature rows.
    ///
    /// Fails if a row has the wrong width, a label is not binary or a value is
    /// not finite.
    pub fn from_rows(labels: Vec<f64>, rows: &[Vec<f64>]) -> Result<Self> {
        if labels.len() != rows.len() {
            return Err(TunerError::InvalidData(format!(
                "{} labels for {} feature rows",
                labels.len(),
                rows.len()
            )));
        }

        let mut columns = vec![Vec::with_capacity(rows.len()); NUM_FEATURES];
        for (idx, (label, row)) in labels.iter().zip(rows).enumerate() {
            if !is_binary_label(*label) {
                return Err(TunerError::InvalidData(format!(
                    "row {} has non-binary label {}",
                    idx, label
                )));
            }
            if row.len() != NUM_FEATURES {
                return Err(TunerError::InvalidData(format!(
                    "row {} has {} features, expected {}",
                    idx,
                    row.len(),
                    NUM_FEATURES
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                if !value.is_finite() {
                    return Err(TunerError::InvalidData(format!(
                        "row {} has non-finite feature value {}",
                        idx, value
                    )));
                }
                column.push(*value);
            }
        }

        Ok(Self { labels, columns })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn num_features(&self) -> usize {
        self.columns.len()
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    /// All values of one feature column.
    pub fn column(&self, feature: usize) -> &[f64] {
        &self.columns[feature]
    }

    /// Copy out one row of feature values.
    pub fn row(&self, idx: usize) -> Vec<f64> {
        self.columns.iter().map(|column| column[idx]).collect()
    }

    /// Fraction of positive labels.
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().sum::<f64>() / self.labels.len() as f64
    }
}

fn is_binary_label(value: f64) -> bool {
    value == 0.0 || value == 1.0
}

/// Load a dataset from a comma-delimited file.
///
/// The first line is a header and is skipped. Column 0 is the label, the
/// remaining ten columns are the features in `FEATURE_NAMES` order.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let invalid = |line: u64, message: String| TunerError::Dataset {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut labels = Vec::new();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        // Blank lines show up as a single empty field.
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }

        if record.len() != NUM_COLUMNS {
            return Err(invalid(
                line,
                format!("expected {} columns, found {}", NUM_COLUMNS, record.len()),
            ));
        }

        let mut values = Vec::with_capacity(NUM_COLUMNS);
        for (col, field) in record.iter().enumerate() {
            let value: f64 = field
                .parse()
                .map_err(|_| invalid(line, format!("column {} is not numeric: {:?}", col, field)))?;
            if !value.is_finite() {
                return Err(invalid(line, format!("column {} is not finite: {:?}", col, field)));
            }
            values.push(value);
        }

        let label = values[0];
        if !is_binary_label(label) {
            return Err(invalid(line, format!("label must be 0 or 1, found {}", label)));
        }

        labels.push(label);
        rows.push(values.split_off(1));
    }

    if labels.is_empty() {
        return Err(invalid(1, "no data rows".to_string()));
    }

    Dataset::from_rows(labels, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "label,aliveCt,aliveT,meanHealthCt,meanHealthT,meanValueCT,meanValueT,roundTime,bombTime,bombDefusing,bombDefused\n";

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_dataset_splits_label_and_features() {
        let file = write_file(&format!(
            "{}1,5,4,100,80.5,4400,3900,95,0,0,0\n0,2,5,30,90,1200,4100,12.5,30,1,0\n",
            HEADER
        ));

        let data = load_dataset(file.path()).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.num_features(), 10);
        assert_eq!(data.labels(), &[1.0, 0.0]);
        assert_eq!(data.column(3), &[80.5, 90.0]);
        assert_eq!(data.row(1)[8], 1.0);
        assert_eq!(data.positive_rate(), 0.5);
    }

    #[test]
    fn test_non_numeric_cell_is_rejected_with_line() {
        let file = write_file(&format!("{}1,5,4,100,80,abc,3900,95,0,0,0\n", HEADER));

        match load_dataset(file.path()) {
            Err(TunerError::Dataset { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.contains("not numeric"));
            }
            other => panic!("expected dataset error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let file = write_file(&format!("{}1,5,4,100,80,4400,3900,95,0,0\n", HEADER));
        assert!(matches!(
            load_dataset(file.path()),
            Err(TunerError::Dataset { .. })
        ));
    }

    #[test]
    fn test_non_binary_label_is_rejected() {
        let file = write_file(&format!("{}2,5,4,100,80,4400,3900,95,0,0,0\n", HEADER));
        match load_dataset(file.path()) {
            Err(TunerError::Dataset { message, .. }) => assert!(message.contains("label")),
            other => panic!("expected dataset error, got {:?}", other),
        }
    }

    #[test]
    fn test_header_only_file_is_rejected() {
        let file = write_file(HEADER);
        assert!(matches!(
            load_dataset(file.path()),
            Err(TunerError::Dataset { .. })
        ));
    }

    #[test]
    fn test_from_rows_rejects_wrong_width() {
        let result = Dataset::from_rows(vec![1.0], &[vec![1.0, 2.0]]);
        assert!(matches!(result, Err(TunerError::InvalidData(_))));
    }

    #[test]
    fn test_from_rows_rejects_bad_label_and_non_finite_value() {
        let row = vec![0.0; NUM_FEATURES];
        match Dataset::from_rows(vec![0.5], &[row.clone()]) {
            Err(TunerError::InvalidData(message)) => assert!(message.contains("non-binary label")),
            other => panic!("expected invalid data, got {:?}", other),
        }

        let mut bad = row;
        bad[4] = f64::NAN;
        assert!(matches!(
            Dataset::from_rows(vec![1.0], &[bad]),
            Err(TunerError::InvalidData(_))
        ));
    }

    #[test]
    fn test_from_rows_rejects_label_count_mismatch() {
        assert!(matches!(
            Dataset::from_rows(vec![1.0, 0.0], &[vec![0.0; NUM_FEATURES]]),
            Err(TunerError::InvalidData(_))
        ));
    }
}

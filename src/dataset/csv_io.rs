// projeto: fireemissionsai
// file: src/dataset/csv_io.rs
// Headerless CSV tables for features, targets and predictions

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim, Writer, WriterBuilder};
use log::{debug, info, warn};
use ndarray::Array2;

use crate::dataset::split::Split;
use crate::error::{GfedError, Result};

/// Destination for admitted (features, targets) pairs.
pub trait ExampleSink {
    fn accept(&mut self, split: Split, features: &[f64], targets: &[f64]) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

struct SplitWriters {
    features: Writer<File>,
    targets: Writer<File>,
}

/// Writes `{split}-features.csv` and `{split}-targets.csv` for every split.
pub struct CsvSink {
    dir: PathBuf,
    writers: HashMap<Split, SplitWriters>,
}

fn headerless_writer(path: &Path) -> Result<Writer<File>> {
    Ok(WriterBuilder::new().has_headers(false).from_path(path)?)
}

fn format_row(row: &[f64]) -> Vec<String> {
    row.iter().map(|v| v.to_string()).collect()
}

impl CsvSink {
    /// Creates `dir` if needed and truncates the six output files.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let mut writers = HashMap::new();
        for split in Split::ALL {
            writers.insert(
                split,
                SplitWriters {
                    features: headerless_writer(&dir.join(split.features_file()))?,
                    targets: headerless_writer(&dir.join(split.targets_file()))?,
                },
            );
        }
        debug!("CSV outputs opened in {}", dir.display());
        Ok(Self { dir: dir.to_path_buf(), writers })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExampleSink for CsvSink {
    fn accept(&mut self, split: Split, features: &[f64], targets: &[f64]) -> Result<()> {
        let writers = self
            .writers
            .get_mut(&split)
            .ok_or_else(|| GfedError::DataProcessing(format!("no writer for split {}", split)))?;
        writers.features.write_record(format_row(features))?;
        writers.targets.write_record(format_row(targets))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        for writers in self.writers.values_mut() {
            writers.features.flush()?;
            writers.targets.flush()?;
        }
        info!("💾 Examples written to {}", self.dir.display());
        Ok(())
    }
}

/// Reads a headerless numeric CSV into a matrix. Ragged rows and empty files are errors.
pub fn read_matrix(path: &Path) -> Result<Array2<f64>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;

    let mut values = Vec::new();
    let mut cols = None;
    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        let width = record.len();
        match cols {
            None => cols = Some(width),
            Some(expected) if expected != width => {
                return Err(GfedError::DataProcessing(format!(
                    "{}: row {} has {} columns, expected {}",
                    path.display(),
                    rows + 1,
                    width,
                    expected
                )));
            }
            _ => {}
        }
        for field in record.iter() {
            let value = field.parse::<f64>().map_err(|e| {
                GfedError::DataProcessing(format!(
                    "{}: row {}: '{}' is not a number ({})",
                    path.display(),
                    rows + 1,
                    field,
                    e
                ))
            })?;
            values.push(value);
        }
        rows += 1;
    }

    let cols = cols.ok_or_else(|| GfedError::DataProcessing(format!("{} is empty", path.display())))?;
    debug!("Read {}x{} matrix from {}", rows, cols, path.display());
    Ok(Array2::from_shape_vec((rows, cols), values)?)
}

pub fn write_matrix(path: &Path, matrix: &Array2<f64>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = headerless_writer(path)?;
    for row in matrix.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Features and targets of one split under `dir`; `None` when the preprocess
/// run wrote no rows to it.
pub fn read_split(dir: &Path, split: Split) -> Result<Option<(Array2<f64>, Array2<f64>)>> {
    let features = dir.join(split.features_file());
    if fs::metadata(&features)?.len() == 0 {
        warn!("⚠️ {} split is empty", split);
        return Ok(None);
    }
    let x = read_matrix(&features)?;
    let y = read_matrix(&dir.join(split.targets_file()))?;
    if x.nrows() != y.nrows() {
        return Err(GfedError::DataProcessing(format!(
            "{} split has {} feature rows but {} target rows",
            split,
            x.nrows(),
            y.nrows()
        )));
    }
    Ok(Some((x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sink_writes_each_split() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        let mut sink = CsvSink::create(&out).unwrap();
        sink.accept(Split::Train, &[2015.0, 1.0, 0.5], &[0.25]).unwrap();
        sink.accept(Split::Train, &[2015.0, 2.0, 1.5], &[0.0]).unwrap();
        sink.accept(Split::Test, &[2016.0, 3.0, -1.0], &[1.0]).unwrap();
        sink.finish().unwrap();

        let train = fs::read_to_string(out.join("train-features.csv")).unwrap();
        assert_eq!(train, "2015,1,0.5\n2015,2,1.5\n");
        let targets = read_matrix(&out.join("train-targets.csv")).unwrap();
        assert_eq!(targets, array![[0.25], [0.0]]);
        let test = read_matrix(&out.join("test-features.csv")).unwrap();
        assert_eq!(test, array![[2016.0, 3.0, -1.0]]);
        assert_eq!(fs::read_to_string(out.join("validation-targets.csv")).unwrap(), "");
    }

    #[test]
    fn test_read_matrix_accepts_scientific_notation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inputs.csv");
        fs::write(&path, "1.000000000000000000e+00, 2.5e-01\n3,4\n").unwrap();
        let m = read_matrix(&path).unwrap();
        assert_eq!(m, array![[1.0, 0.25], [3.0, 4.0]]);
    }

    #[test]
    fn test_read_matrix_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.csv");
        fs::write(&empty, "").unwrap();
        assert!(read_matrix(&empty).is_err());

        let ragged = dir.path().join("ragged.csv");
        fs::write(&ragged, "1,2\n3\n").unwrap();
        assert!(matches!(read_matrix(&ragged), Err(GfedError::DataProcessing(_))));

        let text = dir.path().join("text.csv");
        fs::write(&text, "1,abc\n").unwrap();
        assert!(matches!(read_matrix(&text), Err(GfedError::DataProcessing(_))));

        assert!(read_matrix(&dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn test_read_split() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::create(dir.path()).unwrap();
        sink.accept(Split::Train, &[1.0, 2.0], &[0.5]).unwrap();
        sink.accept(Split::Train, &[3.0, 4.0], &[0.0]).unwrap();
        sink.finish().unwrap();

        let (x, y) = read_split(dir.path(), Split::Train).unwrap().unwrap();
        assert_eq!(x, array![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(y, array![[0.5], [0.0]]);
        assert!(read_split(dir.path(), Split::Validation).unwrap().is_none());

        fs::write(dir.path().join(Split::Test.features_file()), "1,2\n").unwrap();
        fs::write(dir.path().join(Split::Test.targets_file()), "1\n2\n").unwrap();
        assert!(matches!(read_split(dir.path(), Split::Test), Err(GfedError::DataProcessing(_))));

        let missing = tempfile::tempdir().unwrap();
        assert!(matches!(read_split(missing.path(), Split::Train), Err(GfedError::Io(_))));
    }

    #[test]
    fn test_write_then_read_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("predictions.csv");
        let m = array![[0.125, 3.0], [1e-7, -2.0]];
        write_matrix(&path, &m).unwrap();
        assert_eq!(read_matrix(&path).unwrap(), m);
    }
}

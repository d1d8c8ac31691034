// projeto: fireemissionsai
// file: src/gfed/source.rs
// Grid sources: HDF5 files on disk or synthetic years held in memory

use std::path::{Path, PathBuf};

use log::debug;
use ndarray::Array2;

use crate::error::{GfedError, Result};
use crate::gfed::layout::{self, Field, MONTHS};

/// Layers read once per file.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticLayers {
    pub lat: Array2<f32>,
    pub lon: Array2<f32>,
    pub regions: Array2<f32>,
}

impl StaticLayers {
    pub fn new(lat: Array2<f32>, lon: Array2<f32>, regions: Array2<f32>) -> Result<Self> {
        let layers = Self { lat, lon, regions };
        layers.check()?;
        Ok(layers)
    }

    /// The grid shape, taken from the basis regions.
    pub fn shape(&self) -> (usize, usize) {
        self.regions.dim()
    }

    /// Errors unless `lat` and `lon` have the same shape as the regions grid.
    pub fn check(&self) -> Result<()> {
        let shape = self.shape();
        for (name, layer) in [(layout::LATITUDE, &self.lat), (layout::LONGITUDE, &self.lon)] {
            if layer.dim() != shape {
                return Err(GfedError::Shape(format!(
                    "'{}' is {:?} but '{}' is {:?}",
                    name,
                    layer.dim(),
                    layout::BASIS_REGIONS,
                    shape
                )));
            }
        }
        Ok(())
    }
}

/// The six per-month grids of one file, indexed by `Field`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthFrame {
    fields: Vec<Array2<f32>>,
}

impl MonthFrame {
    pub fn new(fields: Vec<Array2<f32>>) -> Result<Self> {
        if fields.len() != Field::COUNT {
            return Err(GfedError::DataProcessing(format!(
                "a month frame needs {} fields, got {}",
                Field::COUNT,
                fields.len()
            )));
        }
        let shape = fields[0].dim();
        if let Some(bad) = fields.iter().find(|f| f.dim() != shape) {
            return Err(GfedError::Shape(format!(
                "month fields disagree on shape: {:?} vs {:?}",
                shape,
                bad.dim()
            )));
        }
        Ok(Self { fields })
    }

    pub fn field(&self, field: Field) -> &Array2<f32> {
        &self.fields[field.index()]
    }

    pub fn shape(&self) -> (usize, usize) {
        self.fields[0].dim()
    }
}

/// Anything that can hand out the yearly grids a `GfedDataParser` walks.
pub trait GridSource {
    fn file_count(&self) -> usize;
    fn year(&self, file: usize) -> Result<u16>;
    fn statics(&self, file: usize) -> Result<StaticLayers>;
    /// `month` is 1-based.
    fn month(&self, file: usize, month: u8) -> Result<MonthFrame>;
}

fn out_of_range(file: usize, count: usize) -> GfedError {
    GfedError::DataProcessing(format!("file index {} out of range ({} files)", file, count))
}

/// Reads validated GFED files, one per year, in the order given.
#[derive(Debug, Clone)]
pub struct Hdf5Source {
    files: Vec<PathBuf>,
    years: Vec<u16>,
}

impl Hdf5Source {
    pub fn new(files: Vec<PathBuf>) -> Result<Self> {
        if files.is_empty() {
            return Err(GfedError::DataProcessing("no HDF files to read".to_string()));
        }
        let years = files
            .iter()
            .map(|f| layout::year_from_path(f).ok_or_else(|| GfedError::MissingYear(f.clone())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { files, years })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn open(&self, file: usize) -> Result<hdf5::File> {
        let path = self
            .files
            .get(file)
            .ok_or_else(|| out_of_range(file, self.files.len()))?;
        Ok(hdf5::File::open(path)?)
    }
}

fn read_grid(file: &hdf5::File, name: &str) -> Result<Array2<f32>> {
    let dataset = file.dataset(name)?;
    let shape = dataset.shape();
    if shape.len() != 2 {
        return Err(GfedError::Shape(format!(
            "dataset '{}' has {} dimensions, expected 2",
            name,
            shape.len()
        )));
    }
    let raw: Vec<f32> = dataset.read_raw::<f32>()?;
    Ok(Array2::from_shape_vec((shape[0], shape[1]), raw)?)
}

impl GridSource for Hdf5Source {
    fn file_count(&self) -> usize {
        self.files.len()
    }

    fn year(&self, file: usize) -> Result<u16> {
        self.years
            .get(file)
            .copied()
            .ok_or_else(|| out_of_range(file, self.files.len()))
    }

    fn statics(&self, file: usize) -> Result<StaticLayers> {
        let h5 = self.open(file)?;
        debug!("Reading static layers of {}", self.files[file].display());
        StaticLayers::new(
            read_grid(&h5, layout::LATITUDE)?,
            read_grid(&h5, layout::LONGITUDE)?,
            read_grid(&h5, layout::BASIS_REGIONS)?,
        )
    }

    fn month(&self, file: usize, month: u8) -> Result<MonthFrame> {
        let h5 = self.open(file)?;
        debug!("Reading month {:02} of {}", month, self.files[file].display());
        let fields = Field::ALL
            .iter()
            .map(|field| read_grid(&h5, &field.dataset_path(month)))
            .collect::<Result<Vec<_>>>()?;
        MonthFrame::new(fields)
    }
}

/// One synthetic year for `MemorySource`.
#[derive(Debug, Clone)]
pub struct MemoryYear {
    pub year: u16,
    pub statics: StaticLayers,
    pub months: Vec<MonthFrame>,
}

impl MemoryYear {
    /// Builds a year of `rows` x `cols` grids. `region` fills the basis
    /// regions, `value(field, month, i, j)` fills every monthly field.
    pub fn generate<R, V>(year: u16, rows: usize, cols: usize, region: R, value: V) -> Self
    where
        R: Fn(usize, usize) -> f32,
        V: Fn(Field, u8, usize, usize) -> f32,
    {
        let statics = StaticLayers {
            lat: Array2::from_shape_fn((rows, cols), |(i, _)| 90.0 - i as f32),
            lon: Array2::from_shape_fn((rows, cols), |(_, j)| -180.0 + j as f32),
            regions: Array2::from_shape_fn((rows, cols), |(i, j)| region(i, j)),
        };
        let months = (1..=MONTHS)
            .map(|month| MonthFrame {
                fields: Field::ALL
                    .iter()
                    .map(|&field| Array2::from_shape_fn((rows, cols), |(i, j)| value(field, month, i, j)))
                    .collect(),
            })
            .collect();
        Self { year, statics, months }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    years: Vec<MemoryYear>,
}

impl MemorySource {
    pub fn new(years: Vec<MemoryYear>) -> Self {
        Self { years }
    }

    fn get(&self, file: usize) -> Result<&MemoryYear> {
        self.years.get(file).ok_or_else(|| out_of_range(file, self.years.len()))
    }
}

impl GridSource for MemorySource {
    fn file_count(&self) -> usize {
        self.years.len()
    }

    fn year(&self, file: usize) -> Result<u16> {
        Ok(self.get(file)?.year)
    }

    fn statics(&self, file: usize) -> Result<StaticLayers> {
        Ok(self.get(file)?.statics.clone())
    }

    fn month(&self, file: usize, month: u8) -> Result<MonthFrame> {
        let year = self.get(file)?;
        if month == 0 || month > MONTHS {
            return Err(GfedError::DataProcessing(format!("month {} out of range", month)));
        }
        year.months
            .get(month as usize - 1)
            .cloned()
            .ok_or_else(|| GfedError::DataProcessing(format!("month {} missing from {}", month, year.year)))
    }
}

/// Sorted list of regular files directly inside `dir`.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    files.retain(|p| p.is_file());
    files.sort();
    Ok(files)
}

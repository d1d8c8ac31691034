// projeto: fireemissionsai
// file: src/gfed/parser.rs
// Walks every (file, month, i, j) state of a grid source and reads entries and targets

use std::collections::HashMap;

use log::{debug, info};

use crate::error::{GfedError, Result};
use crate::gfed::cursor::{Cursor, GridBounds, wrap};
use crate::gfed::layout::Field;
use crate::gfed::source::{GridSource, MonthFrame, StaticLayers};

/// Cells on each side of the centre gathered for a neighbourhood (5x5).
pub const NEIGHBOURHOOD_RADIUS: isize = 2;
pub const NEIGHBOURHOOD_CELLS: usize = 25;

/// Feature columns before the field values: year, month, lat, lon, region.
pub const LEADING_COLUMNS: usize = 5;

/// The six monthly values of one cell, in `Field::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldValues(pub [f32; Field::COUNT]);

impl FieldValues {
    fn read(frame: &MonthFrame, i: usize, j: usize) -> Self {
        let mut values = [0.0; Field::COUNT];
        for field in Field::ALL {
            values[field.index()] = frame.field(field)[[i, j]];
        }
        FieldValues(values)
    }

    pub fn get(&self, field: Field) -> f32 {
        self.0[field.index()]
    }

    pub fn burned_fraction(&self) -> f32 {
        self.get(Field::BurnedFraction)
    }

    pub fn to_row(&self) -> Vec<f64> {
        self.0.iter().map(|&v| v as f64).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub year: u16,
    pub month: u8,
    pub lat: f32,
    pub lon: f32,
    pub region: f32,
    pub values: FieldValues,
    /// 25 values per field, fields in order, row offset outer.
    pub neighbourhood: Option<Vec<f32>>,
}

impl Entry {
    /// Region id 0 marks ocean or cells outside every basis region.
    pub fn is_ocean(&self) -> bool {
        self.region == 0.0
    }

    pub fn features(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(
            LEADING_COLUMNS + Field::COUNT + self.neighbourhood.as_ref().map_or(0, |n| n.len()),
        );
        row.extend([
            self.year as f64,
            self.month as f64,
            self.lat as f64,
            self.lon as f64,
            self.region as f64,
        ]);
        row.extend(self.values.0.iter().map(|&v| v as f64));
        if let Some(cells) = &self.neighbourhood {
            row.extend(cells.iter().map(|&v| v as f64));
        }
        row
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub cursor: Cursor,
    pub entry: Entry,
    pub target: Option<FieldValues>,
}

/// Stateful reader over a `GridSource`.
///
/// The grid shape comes from the first file's basis regions. Static layers
/// and month frames are cached and dropped once the cursor moves past their
/// file.
pub struct GfedDataParser<S: GridSource> {
    source: S,
    bounds: GridBounds,
    cursor: Cursor,
    neighbourhood: bool,
    statics: HashMap<usize, StaticLayers>,
    frames: HashMap<(usize, u8), MonthFrame>,
    finished: bool,
}

impl<S: GridSource> GfedDataParser<S> {
    pub fn new(source: S, neighbourhood: bool) -> Result<Self> {
        let files = source.file_count();
        if files == 0 {
            return Err(GfedError::DataProcessing("grid source holds no files".to_string()));
        }
        let first = source.statics(0)?;
        first.check()?;
        let (rows, cols) = first.shape();
        if rows == 0 || cols == 0 {
            return Err(GfedError::Shape(format!("empty grid {}x{}", rows, cols)));
        }
        let bounds = GridBounds::new(rows, cols, files);
        info!("🗺️ Grid {}x{} across {} file(s), {} states", rows, cols, files, bounds.states());

        let mut statics = HashMap::new();
        statics.insert(0, first);
        Ok(Self {
            source,
            bounds,
            cursor: Cursor::start(),
            neighbourhood,
            statics,
            frames: HashMap::new(),
            finished: false,
        })
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of feature columns `next_example` produces.
    pub fn feature_width(&self) -> usize {
        let extra = if self.neighbourhood { Field::COUNT * NEIGHBOURHOOD_CELLS } else { 0 };
        LEADING_COLUMNS + Field::COUNT + extra
    }

    pub fn has_next_month(&self) -> bool {
        self.cursor.has_next_month()
    }

    pub fn has_next_coordinate(&self) -> bool {
        self.cursor.has_next_coordinate(&self.bounds)
    }

    pub fn has_next_file(&self) -> bool {
        self.cursor.has_next_file(&self.bounds)
    }

    pub fn has_next(&self) -> bool {
        self.cursor.has_next(&self.bounds)
    }

    /// Replaces the cursor with its successor.
    pub fn increment(&mut self) -> Result<()> {
        let next = self.cursor.advance(&self.bounds).ok_or(GfedError::Exhausted)?;
        if next.file != self.cursor.file {
            debug!("Moving to file {} of {}", next.file + 1, self.bounds.files);
            self.frames.retain(|(file, _), _| *file >= next.file);
            self.statics.retain(|file, _| *file >= next.file);
        }
        self.cursor = next;
        Ok(())
    }

    fn check_shape(&self, file: usize, found: (usize, usize)) -> Result<()> {
        let expected = (self.bounds.rows, self.bounds.cols);
        if found != expected {
            return Err(GfedError::GridShapeMismatch { file, expected, found });
        }
        Ok(())
    }

    fn load_statics(&mut self, file: usize) -> Result<&StaticLayers> {
        if !self.statics.contains_key(&file) {
            let layers = self.source.statics(file)?;
            layers.check()?;
            self.check_shape(file, layers.shape())?;
            self.statics.insert(file, layers);
        }
        self.statics
            .get(&file)
            .ok_or_else(|| GfedError::DataProcessing(format!("static layers of file {} not loaded", file)))
    }

    fn load_frame(&mut self, file: usize, month: u8) -> Result<&MonthFrame> {
        if !self.frames.contains_key(&(file, month)) {
            let frame = self.source.month(file, month)?;
            self.check_shape(file, frame.shape())?;
            self.frames.insert((file, month), frame);
        }
        self.frames
            .get(&(file, month))
            .ok_or_else(|| GfedError::DataProcessing(format!("month {} of file {} not loaded", month, file)))
    }

    /// Reads the cell under the cursor, optionally with its 5x5 neighbourhood.
    pub fn get_entry(&mut self, neighbourhood: bool) -> Result<Entry> {
        let Cursor { file, month, i, j } = self.cursor;
        let year = self.source.year(file)?;
        let (lat, lon, region) = {
            let statics = self.load_statics(file)?;
            (statics.lat[[i, j]], statics.lon[[i, j]], statics.regions[[i, j]])
        };
        let (rows, cols) = (self.bounds.rows, self.bounds.cols);
        let frame = self.load_frame(file, month)?;
        let values = FieldValues::read(frame, i, j);

        let neighbourhood = neighbourhood.then(|| {
            let mut cells = Vec::with_capacity(Field::COUNT * NEIGHBOURHOOD_CELLS);
            for field in Field::ALL {
                let grid = frame.field(field);
                for di in -NEIGHBOURHOOD_RADIUS..=NEIGHBOURHOOD_RADIUS {
                    for dj in -NEIGHBOURHOOD_RADIUS..=NEIGHBOURHOOD_RADIUS {
                        cells.push(grid[[wrap(i, di, rows), wrap(j, dj, cols)]]);
                    }
                }
            }
            cells
        });

        Ok(Entry { year, month, lat, lon, region, values, neighbourhood })
    }

    /// Values of the same cell one month later, or `None` at the end of the last file.
    pub fn get_target(&mut self) -> Result<Option<FieldValues>> {
        let Some((file, month)) = self.cursor.target_position(&self.bounds) else {
            return Ok(None);
        };
        let (i, j) = (self.cursor.i, self.cursor.j);
        let frame = self.load_frame(file, month)?;
        Ok(Some(FieldValues::read(frame, i, j)))
    }

    /// Entry and target under the cursor, then advances. `None` once every
    /// state has been returned.
    pub fn next_example(&mut self) -> Result<Option<Example>> {
        if self.finished {
            return Ok(None);
        }
        let cursor = self.cursor;
        let entry = self.get_entry(self.neighbourhood)?;
        let target = self.get_target()?;
        if self.has_next() {
            self.increment()?;
        } else {
            self.finished = true;
        }
        Ok(Some(Example { cursor, entry, target }))
    }
}

impl<S: GridSource> Iterator for GfedDataParser<S> {
    type Item = Result<Example>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_example() {
            Ok(Some(example)) => Some(Ok(example)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfed::fixtures::{cell_value, write_gfed_file};
    use crate::gfed::source::{Hdf5Source, MemoryYear, MemorySource};
    use ndarray::Array2;

    fn memory_parser(rows: usize, cols: usize, years: &[u16], neighbourhood: bool) -> GfedDataParser<MemorySource> {
        let years = years
            .iter()
            .map(|&y| {
                MemoryYear::generate(y, rows, cols, |i, j| (i + j) as f32, move |f, m, i, j| {
                    cell_value(f, m, i, j) + (y - 2000) as f32 * 10_000.0
                })
            })
            .collect();
        GfedDataParser::new(MemorySource::new(years), neighbourhood).unwrap()
    }

    #[test]
    fn test_iterates_all_states() {
        let mut parser = memory_parser(10, 9, &[2001], false);
        let mut states = 1;
        while parser.has_next() {
            parser.increment().unwrap();
            states += 1;
        }
        assert_eq!(states, 10 * 9 * 12);
        assert!(matches!(parser.increment(), Err(GfedError::Exhausted)));
        assert_eq!(parser.get_target().unwrap(), None);
    }

    #[test]
    fn test_iterator_yields_each_state_once() {
        let parser = memory_parser(3, 2, &[2001, 2002], false);
        let examples: Vec<Example> = parser.collect::<Result<_>>().unwrap();
        assert_eq!(examples.len(), 3 * 2 * 12 * 2);

        let without_target = examples.iter().filter(|e| e.target.is_none()).count();
        // December of every cell in the last file has no successor.
        assert_eq!(without_target, 3 * 2);
        assert!(examples.last().unwrap().target.is_none());
    }

    #[test]
    fn test_entry_values() {
        let mut parser = memory_parser(4, 3, &[2005], false);
        parser.increment().unwrap();
        let entry = parser.get_entry(false).unwrap();
        assert_eq!(entry.year, 2005);
        assert_eq!(entry.month, 2);
        assert_eq!(entry.lat, 90.0);
        assert_eq!(entry.lon, -180.0);
        assert!(entry.is_ocean());
        assert_eq!(entry.values.get(Field::Rh), cell_value(Field::Rh, 2, 0, 0) + 50_000.0);
        assert!(entry.neighbourhood.is_none());

        let features = entry.features();
        assert_eq!(features.len(), LEADING_COLUMNS + Field::COUNT);
        assert_eq!(features[0], 2005.0);
        assert_eq!(features[1], 2.0);
        assert_eq!(features[10], entry.values.burned_fraction() as f64);
    }

    #[test]
    fn test_target_rolls_into_next_file() {
        let mut parser = memory_parser(2, 2, &[2001, 2002], false);
        for _ in 0..11 {
            parser.increment().unwrap();
        }
        assert_eq!(parser.cursor().month, 12);
        let target = parser.get_target().unwrap().unwrap();
        assert_eq!(target.get(Field::Bb), cell_value(Field::Bb, 1, 0, 0) + 20_000.0);

        let mut parser = memory_parser(2, 2, &[2001], false);
        for _ in 0..11 {
            parser.increment().unwrap();
        }
        // December of the last file, but other cells remain.
        assert!(parser.has_next());
        assert_eq!(parser.get_target().unwrap(), None);
    }

    #[test]
    fn test_neighbourhood_wraps_at_edges() {
        let mut parser = memory_parser(10, 9, &[2001], true);
        let entry = parser.get_entry(true).unwrap();
        let cells = entry.neighbourhood.as_ref().unwrap();
        assert_eq!(cells.len(), Field::COUNT * NEIGHBOURHOOD_CELLS);

        // First cell of the BB window is offset (-2, -2) from (0, 0).
        assert_eq!(cells[0], cell_value(Field::Bb, 1, 8, 7) + 10_000.0);
        // Centre of the window is the cell itself.
        assert_eq!(cells[12], entry.values.get(Field::Bb));
        // Offset (+2, +2).
        assert_eq!(cells[24], cell_value(Field::Bb, 1, 2, 2) + 10_000.0);
        // Second field starts at 25.
        assert_eq!(cells[25 + 12], entry.values.get(Field::Npp));

        assert_eq!(entry.features().len(), parser.feature_width());
    }

    #[test]
    fn test_shape_mismatch_between_files() {
        let source = MemorySource::new(vec![
            MemoryYear::generate(2001, 3, 3, |_, _| 1.0, |_, _, _, _| 0.0),
            MemoryYear::generate(2002, 4, 3, |_, _| 1.0, |_, _, _, _| 0.0),
        ]);
        let mut parser = GfedDataParser::new(source, false).unwrap();
        let result: Result<Vec<Example>> = parser.by_ref().collect();
        assert!(matches!(result, Err(GfedError::GridShapeMismatch { file: 1, .. })));
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_latitude_shape_must_match_grid() {
        let mut year = MemoryYear::generate(2001, 4, 4, |_, _| 1.0, |_, _, _, _| 0.0);
        year.statics.lat = Array2::zeros((2, 4));
        let result = GfedDataParser::new(MemorySource::new(vec![year]), false);
        assert!(matches!(result, Err(GfedError::Shape(_))));
    }

    #[test]
    fn test_later_file_statics_checked() {
        let first = MemoryYear::generate(2001, 2, 2, |_, _| 1.0, |_, _, _, _| 0.0);
        let mut second = MemoryYear::generate(2002, 2, 2, |_, _| 1.0, |_, _, _, _| 0.0);
        second.statics.lon = Array2::zeros((2, 1));
        let mut parser = GfedDataParser::new(MemorySource::new(vec![first, second]), false).unwrap();

        let result: Result<Vec<Example>> = parser.by_ref().collect();
        assert!(matches!(result, Err(GfedError::Shape(_))));
        assert_eq!(parser.cursor().file, 1);
    }

    #[test]
    fn test_empty_source_rejected() {
        assert!(GfedDataParser::new(MemorySource::default(), false).is_err());
    }

    #[test]
    fn test_reads_hdf5_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("GFED4.1s_2015.hdf5");
        let second = dir.path().join("GFED4.1s_2016.hdf5");
        write_gfed_file(&first, 3, 2, &[]).unwrap();
        write_gfed_file(&second, 3, 2, &[]).unwrap();

        let source = Hdf5Source::new(vec![first, second]).unwrap();
        let mut parser = GfedDataParser::new(source, true).unwrap();
        let examples: Vec<Example> = parser.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(examples.len(), 3 * 2 * 12 * 2);

        let december = examples
            .iter()
            .find(|e| e.cursor == Cursor { file: 0, month: 12, i: 1, j: 1 })
            .unwrap();
        assert_eq!(december.entry.year, 2015);
        let target = december.target.unwrap();
        assert_eq!(target.get(Field::Dm), cell_value(Field::Dm, 1, 1, 1));
        assert!(!parser.has_next());
    }
}

// projeto: fireemissionsai
// file: src/gfed/layout.rs
// Group layout of a GFED4.1s yearly HDF5 file

use std::path::Path;

pub const MONTHS: u8 = 12;

pub const HDF_EXTENSIONS: [&str; 7] = ["hdf", "hdf4", "hdf5", "h4", "h5", "he2", "he5"];

pub const BASIS_REGIONS: &str = "ancill/basis_regions";
pub const LONGITUDE: &str = "lon";
pub const LATITUDE: &str = "lat";

/// Groups that must exist once per file, in the order they are reported.
pub const STATIC_GROUPS: [&str; 3] = [BASIS_REGIONS, LONGITUDE, LATITUDE];

/// Monthly groups and the leaves every `{group}/{MM}` subgroup must hold.
pub const MONTHLY_GROUPS: [(&str, &[&str]); 3] = [
    ("biosphere", &["BB", "NPP", "Rh"]),
    ("burned_area", &["burned_fraction"]),
    ("emissions", &["C", "DM"]),
];

/// Per-month values, in feature and target column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Bb,
    Npp,
    Rh,
    C,
    Dm,
    BurnedFraction,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Bb,
        Field::Npp,
        Field::Rh,
        Field::C,
        Field::Dm,
        Field::BurnedFraction,
    ];

    pub const COUNT: usize = 6;

    pub fn group(self) -> &'static str {
        match self {
            Field::Bb | Field::Npp | Field::Rh => "biosphere",
            Field::C | Field::Dm => "emissions",
            Field::BurnedFraction => "burned_area",
        }
    }

    pub fn leaf(self) -> &'static str {
        match self {
            Field::Bb => "BB",
            Field::Npp => "NPP",
            Field::Rh => "Rh",
            Field::C => "C",
            Field::Dm => "DM",
            Field::BurnedFraction => "burned_fraction",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Dataset path for this field in `month` (1..=12).
    pub fn dataset_path(self, month: u8) -> String {
        leaf_path(self.group(), month, self.leaf())
    }
}

pub fn month_path(group: &str, month: u8) -> String {
    format!("{}/{:02}", group, month)
}

pub fn leaf_path(group: &str, month: u8, leaf: &str) -> String {
    format!("{}/{:02}/{}", group, month, leaf)
}

pub fn has_hdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            HDF_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Last run of exactly four ASCII digits in the file stem, e.g. `GFED4.1s_2015.hdf5` -> 2015.
pub fn year_from_path(path: &Path) -> Option<u16> {
    let stem = path.file_stem()?.to_str()?;
    let bytes = stem.as_bytes();
    let mut year = None;
    let mut start = 0;
    while start < bytes.len() {
        if !bytes[start].is_ascii_digit() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end - start == 4 {
            year = stem[start..end].parse().ok();
        }
        start = end;
    }
    year
}

// projeto: fireemissionsai
// file: src/gfed/validator.rs
// Structural checks for GFED4.1s_yyyy HDF5 files

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Result;
use crate::gfed::layout::{self, MONTHLY_GROUPS, MONTHS, STATIC_GROUPS};

/// Every group a file was expected to contain but did not.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub missing: Vec<String>,
}

impl ValidationReport {
    /// A file that could not be opened holds none of the expected groups.
    pub fn unreadable(path: &Path) -> Self {
        let mut missing: Vec<String> = STATIC_GROUPS.iter().map(|g| g.to_string()).collect();
        for (group, _) in MONTHLY_GROUPS {
            missing.extend((1..=MONTHS).map(|month| layout::month_path(group, month)));
        }
        Self { path: path.to_path_buf(), missing }
    }

    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }

    /// One `Expected group ...` line per missing group.
    pub fn diagnostics(&self) -> Vec<String> {
        self.missing
            .iter()
            .map(|group| format!("Expected group '{}' not in HDF file '{}'", group, self.path.display()))
            .collect()
    }
}

pub struct Validator;

impl Validator {
    /// True when `path` is an existing regular file with an HDF extension.
    pub fn valid_hdf_file<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        path.is_file() && layout::has_hdf_extension(path)
    }

    /// Opens the file and lists every missing group in one pass.
    ///
    /// Static groups are checked first, then each monthly group for every
    /// month. Leaves are only checked under month groups that exist, so a
    /// missing `biosphere/03` is reported once rather than once per leaf.
    pub fn inspect<P: AsRef<Path>>(path: P) -> Result<ValidationReport> {
        let path = path.as_ref();
        let file = hdf5::File::open(path)?;
        let mut missing = Vec::new();

        for group in STATIC_GROUPS {
            if !contains(&file, group) {
                missing.push(group.to_string());
            }
        }

        for (group, leaves) in MONTHLY_GROUPS {
            for month in 1..=MONTHS {
                let month_group = layout::month_path(group, month);
                if !contains(&file, &month_group) {
                    missing.push(month_group);
                    continue;
                }
                missing.extend(Self::missing_leaf_groups(&file, group, month, leaves));
            }
        }

        debug!("{}: {} missing group(s)", path.display(), missing.len());
        Ok(ValidationReport { path: path.to_path_buf(), missing })
    }

    fn missing_leaf_groups(file: &hdf5::File, group: &str, month: u8, leaves: &[&str]) -> Vec<String> {
        leaves
            .iter()
            .map(|leaf| layout::leaf_path(group, month, leaf))
            .filter(|full| !contains(file, full))
            .collect()
    }

    /// Prints one line per missing group and returns whether the file is usable.
    /// A file that cannot be opened is reported as missing every group.
    pub fn valid_hdf_structure<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        let report = Self::inspect(path).unwrap_or_else(|e| {
            debug!("Unable to open {}: {}", path.display(), e);
            ValidationReport::unreadable(path)
        });
        for line in report.diagnostics() {
            println!("{}", line);
        }
        report.is_valid()
    }
}

/// Walks `a/b/c` one component at a time so a missing parent reads as absent.
fn contains(file: &hdf5::File, path: &str) -> bool {
    let mut prefix = String::with_capacity(path.len());
    path.split('/').all(|part| {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(part);
        file.link_exists(&prefix)
    })
}

// projeto: fireemissionsai
// file: src/gfed/fixtures.rs
// Minimal GFED-shaped HDF5 files written on the fly for tests

use std::path::Path;

use crate::gfed::layout::{self, Field, MONTHLY_GROUPS, MONTHS};

/// Deterministic value for a field cell, unique on grids up to 10x10.
pub(crate) fn cell_value(field: Field, month: u8, i: usize, j: usize) -> f32 {
    (field.index() * 1000 + month as usize * 100 + i * 10 + j) as f32
}

pub(crate) fn region_value(i: usize, j: usize) -> f32 {
    if i == 0 && j == 0 { 0.0 } else { 1.0 + (i % 14) as f32 }
}

/// Writes a GFED-like file of `rows` x `cols`, leaving out any group or
/// dataset whose full path is listed in `omit` (and everything below it).
pub(crate) fn write_gfed_file(
    path: &Path,
    rows: usize,
    cols: usize,
    omit: &[&str],
) -> hdf5::Result<()> {
    let skipped = |p: &str| omit.iter().any(|o| p == *o || p.starts_with(&format!("{}/", o)));
    let file = hdf5::File::create(path)?;

    let grid = |f: &dyn Fn(usize, usize) -> f32| -> Vec<f32> {
        (0..rows).flat_map(|i| (0..cols).map(move |j| (i, j))).map(|(i, j)| f(i, j)).collect()
    };

    if !skipped("ancill") {
        let ancill = file.create_group("ancill")?;
        if !skipped(layout::BASIS_REGIONS) {
            let ds = ancill.new_dataset::<f32>().shape((rows, cols)).create("basis_regions")?;
            ds.write_raw(&grid(&region_value)[..])?;
        }
    }
    if !skipped(layout::LATITUDE) {
        let ds = file.new_dataset::<f32>().shape((rows, cols)).create(layout::LATITUDE)?;
        ds.write_raw(&grid(&|i, _| 90.0 - i as f32)[..])?;
    }
    if !skipped(layout::LONGITUDE) {
        let ds = file.new_dataset::<f32>().shape((rows, cols)).create(layout::LONGITUDE)?;
        ds.write_raw(&grid(&|_, j| -180.0 + j as f32)[..])?;
    }

    for (group, leaves) in MONTHLY_GROUPS {
        if skipped(group) {
            continue;
        }
        let top = file.create_group(group)?;
        for month in 1..=MONTHS {
            let month_name = format!("{:02}", month);
            if skipped(&layout::month_path(group, month)) {
                continue;
            }
            let month_group = top.create_group(&month_name)?;
            for leaf in leaves.iter() {
                if skipped(&layout::leaf_path(group, month, leaf)) {
                    continue;
                }
                let field = Field::ALL
                    .into_iter()
                    .find(|f| f.group() == group && f.leaf() == *leaf)
                    .unwrap();
                let ds = month_group.new_dataset::<f32>().shape((rows, cols)).create(*leaf)?;
                ds.write_raw(&grid(&|i, j| cell_value(field, month, i, j))[..])?;
            }
        }
    }
    Ok(())
}

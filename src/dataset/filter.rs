// projeto: fireemissionsai
// file: src/dataset/filter.rs
// Decides which parser states become training examples

use crate::gfed::parser::{Entry, FieldValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    /// Region id 0: ocean or outside every basis region.
    Ocean,
    /// No following month exists.
    NoTarget,
    /// Target has no burned area and the previous target had none either.
    Unburned,
}

/// Keeps cells whose next month burns, plus the first unburned month after
/// a burning one so the end of a fire is still seen in training.
#[derive(Debug, Clone, Default)]
pub struct ExampleFilter {
    previous_burning: bool,
}

impl ExampleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn judge(&mut self, entry: &Entry, target: Option<&FieldValues>) -> Verdict {
        if entry.is_ocean() {
            return Verdict::Ocean;
        }
        let Some(target) = target else {
            self.previous_burning = false;
            return Verdict::NoTarget;
        };
        let burning = target.burned_fraction() != 0.0;
        let admit = burning || self.previous_burning;
        self.previous_burning = burning;
        if admit { Verdict::Admit } else { Verdict::Unburned }
    }
}

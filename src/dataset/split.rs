// projeto: fireemissionsai
// file: src/dataset/split.rs
// Train / validation / test bucketing by running example count

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Validation, Split::Test];

    pub fn name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
            Split::Test => "test",
        }
    }

    pub fn features_file(self) -> String {
        format!("{}-features.csv", self.name())
    }

    pub fn targets_file(self) -> String {
        format!("{}-targets.csv", self.name())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Buckets example `n` by `n % 100`: the first `train_percent` buckets go to
/// train, the next `test_percent` to test, the rest to validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPolicy {
    pub train_percent: u32,
    pub test_percent: u32,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self { train_percent: 90, test_percent: 4 }
    }
}

impl SplitPolicy {
    pub fn new(train_percent: u32, test_percent: u32) -> Self {
        Self { train_percent, test_percent }
    }

    pub fn assign(&self, index: usize) -> Split {
        let bucket = (index % 100) as u32;
        if bucket < self.train_percent {
            Split::Train
        } else if bucket < self.train_percent + self.test_percent {
            Split::Test
        } else {
            Split::Validation
        }
    }
}

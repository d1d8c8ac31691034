// projeto: fireemissionsai
// file: src/gfed/cursor.rs
// Position of the parser in (file, month, i, j) space

use crate::gfed::layout::MONTHS;

/// Extent of the space a cursor walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub rows: usize,
    pub cols: usize,
    pub files: usize,
}

impl GridBounds {
    pub fn new(rows: usize, cols: usize, files: usize) -> Self {
        Self { rows, cols, files }
    }

    /// Number of cursor states, i.e. rows * cols * 12 * files.
    pub fn states(&self) -> usize {
        self.rows * self.cols * MONTHS as usize * self.files
    }
}

/// Immutable cursor. Advancing returns a new value; month moves fastest,
/// then `i`, then `j`, then the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub file: usize,
    /// 1..=12
    pub month: u8,
    pub i: usize,
    pub j: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self::start()
    }
}

impl Cursor {
    pub fn start() -> Self {
        Self { file: 0, month: 1, i: 0, j: 0 }
    }

    pub fn has_next_month(&self) -> bool {
        self.month < MONTHS
    }

    pub fn has_next_coordinate(&self, bounds: &GridBounds) -> bool {
        self.i + 1 < bounds.rows || self.j + 1 < bounds.cols
    }

    pub fn has_next_file(&self, bounds: &GridBounds) -> bool {
        self.file + 1 < bounds.files
    }

    /// False only on the last month of the last cell of the last file.
    pub fn has_next(&self, bounds: &GridBounds) -> bool {
        self.has_next_month() || self.has_next_coordinate(bounds) || self.has_next_file(bounds)
    }

    pub fn advance(&self, bounds: &GridBounds) -> Option<Cursor> {
        if self.has_next_month() {
            Some(Cursor { month: self.month + 1, ..*self })
        } else if self.i + 1 < bounds.rows {
            Some(Cursor { month: 1, i: self.i + 1, ..*self })
        } else if self.j + 1 < bounds.cols {
            Some(Cursor { month: 1, i: 0, j: self.j + 1, ..*self })
        } else if self.has_next_file(bounds) {
            Some(Cursor { file: self.file + 1, month: 1, i: 0, j: 0 })
        } else {
            None
        }
    }

    /// File and month holding the target for this cursor: the next month of
    /// the same file, or January of the next file after December.
    pub fn target_position(&self, bounds: &GridBounds) -> Option<(usize, u8)> {
        if self.has_next_month() {
            Some((self.file, self.month + 1))
        } else if self.has_next_file(bounds) {
            Some((self.file + 1, 1))
        } else {
            None
        }
    }
}

/// `index + offset` wrapped onto `0..len`, so -2 from 0 lands on `len - 2`.
pub fn wrap(index: usize, offset: isize, len: usize) -> usize {
    (index as isize + offset).rem_euclid(len as isize) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visits_every_state_once() {
        let bounds = GridBounds::new(10, 9, 1);
        let mut cursor = Cursor::start();
        let mut visited = std::collections::HashSet::new();
        visited.insert(cursor);
        while cursor.has_next(&bounds) {
            cursor = cursor.advance(&bounds).unwrap();
            assert!(visited.insert(cursor), "state visited twice: {:?}", cursor);
        }
        assert_eq!(visited.len(), 10 * 9 * 12);
        assert_eq!(visited.len(), bounds.states());
        assert_eq!(cursor, Cursor { file: 0, month: 12, i: 9, j: 8 });
        assert_eq!(cursor.advance(&bounds), None);
    }

    #[test]
    fn test_has_next_false_only_at_terminal_state() {
        let bounds = GridBounds::new(2, 3, 2);
        let mut cursor = Cursor::start();
        let mut steps = 1;
        while let Some(next) = cursor.advance(&bounds) {
            assert!(cursor.has_next(&bounds));
            cursor = next;
            steps += 1;
        }
        assert!(!cursor.has_next(&bounds));
        assert_eq!(steps, bounds.states());
        assert_eq!(cursor, Cursor { file: 1, month: 12, i: 1, j: 2 });
    }

    #[test]
    fn test_has_next_month() {
        for month in 1..=12u8 {
            let cursor = Cursor { month, ..Cursor::start() };
            assert_eq!(cursor.has_next_month(), month != 12);
        }
    }

    #[test]
    fn test_advance_order() {
        let bounds = GridBounds::new(2, 2, 2);
        let december = Cursor { file: 0, month: 12, i: 0, j: 0 };
        assert_eq!(december.advance(&bounds), Some(Cursor { file: 0, month: 1, i: 1, j: 0 }));

        let last_row = Cursor { file: 0, month: 12, i: 1, j: 0 };
        assert_eq!(last_row.advance(&bounds), Some(Cursor { file: 0, month: 1, i: 0, j: 1 }));

        let last_cell = Cursor { file: 0, month: 12, i: 1, j: 1 };
        assert!(!last_cell.has_next_coordinate(&bounds));
        assert_eq!(last_cell.advance(&bounds), Some(Cursor { file: 1, month: 1, i: 0, j: 0 }));
    }

    #[test]
    fn test_target_position() {
        let bounds = GridBounds::new(2, 2, 2);
        assert_eq!(Cursor::start().target_position(&bounds), Some((0, 2)));

        let year_end = Cursor { file: 0, month: 12, i: 1, j: 0 };
        assert_eq!(year_end.target_position(&bounds), Some((1, 1)));

        let last_year_end = Cursor { file: 1, month: 12, i: 0, j: 0 };
        assert_eq!(last_year_end.target_position(&bounds), None);
        let terminal = Cursor { file: 1, month: 12, i: 1, j: 1 };
        assert_eq!(terminal.target_position(&bounds), None);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap(0, -2, 10), 8);
        assert_eq!(wrap(0, -1, 10), 9);
        assert_eq!(wrap(1, -2, 10), 9);
        assert_eq!(wrap(9, 2, 10), 1);
        assert_eq!(wrap(4, 1, 10), 5);
        assert_eq!(wrap(0, -2, 1), 0);
    }
}

//! Resizable 2D character map: the Deolang program is simultaneously
//! code and data, so the grid must tolerate growth mid-execution. This
//! mirrors the teacher's `MainBus` (addressable, mutable memory) more
//! than it mirrors any parser: there is no separate AST, just cells.

use std::fs;
use std::path::Path;

use getset::CopyGetters;

use crate::error::GridError;

/// A single grid cell. `None` is the empty sentinel spec.md refers to
/// throughout — never a faulting out-of-bounds marker, just "nothing
/// here yet."
pub type Cell = Option<char>;

/// The 2D character map backing a running Deolang program.
///
/// Invariants: every row has exactly `cols` cells; the grid only ever
/// grows (via `set` or `merge`), never shrinks.
#[derive(Debug, Clone, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    /// Build a grid from text content: split on line terminators, strip
    /// a single trailing newline per line, pad ragged rows to the
    /// widest line with empty cells.
    pub fn from_text(content: &str) -> Self {
        let raw_rows: Vec<Vec<char>> = content.lines().map(|line| line.chars().collect()).collect();

        let rows = raw_rows.len();
        let cols = raw_rows.iter().map(Vec::len).max().unwrap_or(0);

        let cells = raw_rows
            .into_iter()
            .map(|mut row| {
                let mut padded: Vec<Cell> = row.drain(..).map(Some).collect();
                padded.resize(cols, None);
                padded
            })
            .collect();

        Grid { rows, cols, cells }
    }

    /// Load a grid from a UTF-8 text file. Fails with
    /// [`GridError::Io`] on any read error; there is no "neither
    /// content nor file" branch here because the file path is always
    /// given — see [`Grid::new`] for the constructor that allows both
    /// to be absent.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GridError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| GridError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_text(&content))
    }

    /// Build a grid the way a host normally has it to hand: either
    /// inline content or a path to read it from. `content` wins if
    /// both are given; with neither (or a `file` that doesn't exist),
    /// this fails with [`GridError::InvalidSource`], matching the
    /// source loader's `raise ValueError` when it has nothing to read.
    pub fn new(file: Option<&Path>, content: Option<&str>) -> Result<Self, GridError> {
        if let Some(content) = content {
            return Ok(Self::from_text(content));
        }
        match file {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Err(GridError::InvalidSource),
        }
    }

    /// Read the cell at `(x, y)`. Out-of-bounds and negative
    /// coordinates return the empty sentinel; this never panics.
    pub fn get(&self, x: i64, y: i64) -> Cell {
        if y < 0 || x < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        self.cells.get(y).and_then(|row| row.get(x)).copied().flatten()
    }

    /// Write `ch` at `(x, y)`, growing the grid as needed. Negative
    /// coordinates are a silent no-op.
    pub fn set(&mut self, x: i64, y: i64, ch: char) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        self.ensure_size(x + 1, y + 1);
        self.cells[y][x] = Some(ch);
    }

    fn ensure_size(&mut self, width: usize, height: usize) {
        if height > self.rows {
            self.cells.resize_with(height, || vec![None; self.cols]);
            self.rows = height;
        }
        if width > self.cols {
            for row in &mut self.cells {
                row.resize(width, None);
            }
            self.cols = width;
        }
    }

    /// Overlay another grid, loaded from `path`, at `(xoff, yoff)`.
    /// Empty cells of the overlay never overwrite existing content.
    /// Returns `false` on any failure (missing file, unreadable) —
    /// this is the one error kind spec.md's `MergeFailure` names as
    /// never propagating; the `M` opcode discards it outright.
    pub fn merge(&mut self, path: impl AsRef<Path>, xoff: i64, yoff: i64) -> bool {
        let Ok(overlay) = Grid::from_file(path) else {
            return false;
        };

        if xoff < 0 || yoff < 0 {
            return false;
        }
        let (xoff, yoff) = (xoff as usize, yoff as usize);

        self.ensure_size(xoff + overlay.cols, yoff + overlay.rows);

        for (r, row) in overlay.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if let Some(ch) = cell {
                    self.cells[r + yoff][c + xoff] = Some(*ch);
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_text_strips_trailing_newline_per_line() {
        let g = Grid::from_text("ab\ncd\n");
        assert_eq!(g.rows(), 2);
        assert_eq!(g.cols(), 2);
        assert_eq!(g.get(0, 0), Some('a'));
        assert_eq!(g.get(1, 1), Some('d'));
    }

    #[test]
    fn from_text_pads_ragged_rows() {
        let g = Grid::from_text("abc\nd");
        assert_eq!(g.cols(), 3);
        assert_eq!(g.get(0, 1), Some('d'));
        assert_eq!(g.get(1, 1), None);
    }

    #[test]
    fn from_text_empty_content_is_zero_by_zero() {
        let g = Grid::from_text("");
        assert_eq!(g.rows(), 0);
        assert_eq!(g.cols(), 0);
    }

    #[test]
    fn new_prefers_content_over_file() {
        let g = Grid::new(Some(Path::new("/nonexistent/path/xyz")), Some("ab")).unwrap();
        assert_eq!(g.get(0, 0), Some('a'));
    }

    #[test]
    fn new_falls_back_to_an_existing_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "q").unwrap();
        let g = Grid::new(Some(f.path()), None).unwrap();
        assert_eq!(g.get(0, 0), Some('q'));
    }

    #[test]
    fn new_with_neither_content_nor_an_existing_file_is_invalid_source() {
        let err = Grid::new(Some(Path::new("/nonexistent/path/xyz")), None).unwrap_err();
        assert!(matches!(err, GridError::InvalidSource));
        let err = Grid::new(None, None).unwrap_err();
        assert!(matches!(err, GridError::InvalidSource));
    }

    #[test]
    fn get_out_of_bounds_never_faults() {
        let g = Grid::from_text("a");
        assert_eq!(g.get(-1, 0), None);
        assert_eq!(g.get(0, -1), None);
        assert_eq!(g.get(100, 100), None);
    }

    #[test]
    fn set_negative_coordinates_is_noop() {
        let mut g = Grid::from_text("a");
        g.set(-1, 0, 'x');
        g.set(0, -1, 'x');
        assert_eq!(g.rows(), 1);
        assert_eq!(g.cols(), 1);
    }

    #[test]
    fn set_grows_the_grid_monotonically() {
        let mut g = Grid::from_text("a");
        g.set(3, 2, 'z');
        assert_eq!(g.rows(), 3);
        assert_eq!(g.cols(), 4);
        assert_eq!(g.get(3, 2), Some('z'));
        assert_eq!(g.get(0, 0), Some('a'));
    }

    #[test]
    fn merge_overlays_non_empty_cells_only() {
        let mut base = Grid::from_text("XXXX\nXXXX");

        let mut overlay_file = tempfile::NamedTempFile::new().unwrap();
        // Second line is shorter, so its padded-out column is the
        // empty sentinel and must not overwrite the base's 'X' there.
        write!(overlay_file, "AB\nC").unwrap();

        assert!(base.merge(overlay_file.path(), 0, 0));
        assert_eq!(base.get(0, 0), Some('A'));
        assert_eq!(base.get(1, 0), Some('B'));
        assert_eq!(base.get(0, 1), Some('C'));
        assert_eq!(base.get(1, 1), Some('X')); // overlay's padded empty cell: no overwrite
        assert_eq!(base.get(2, 0), Some('X')); // untouched, outside overlay's width
    }

    #[test]
    fn merge_missing_file_fails_silently() {
        let mut base = Grid::from_text("X");
        assert!(!base.merge("/nonexistent/path/to/grid.deo", 0, 0));
        assert_eq!(base.get(0, 0), Some('X'));
    }

    #[test]
    fn merge_extends_the_base_grid() {
        let mut base = Grid::from_text("X");

        let mut overlay_file = tempfile::NamedTempFile::new().unwrap();
        write!(overlay_file, "YY").unwrap();

        assert!(base.merge(overlay_file.path(), 2, 2));
        assert_eq!(base.rows(), 3);
        assert_eq!(base.cols(), 4);
        assert_eq!(base.get(2, 2), Some('Y'));
        assert_eq!(base.get(3, 2), Some('Y'));
    }
}

use std::fmt;

use crate::ConfigError;

use super::piece::{Coord, PieceBlocks, Rgb};

/// A playfield of colored cells.
///
/// Implementations own their grid exclusively: cells change only through
/// [`lock`](Self::lock) and [`clear_lines`](Self::clear_lines). Dimensions are
/// fixed for the board's lifetime.
pub trait Board: fmt::Debug {
    fn cols(&self) -> usize;

    fn rows(&self) -> usize;

    /// Color of the cell at `(x, y)`, or `None` if it is empty or outside the
    /// board.
    fn cell(&self, x: i32, y: i32) -> Option<Rgb>;

    /// Writes the piece's color into its cells, then clears full lines.
    ///
    /// Cells outside the board are skipped. Returns the number of cleared
    /// lines.
    fn lock(&mut self, blocks: &PieceBlocks) -> usize;

    /// Removes every full row and prepends as many empty rows.
    ///
    /// Returns the number of removed rows. Calling it on a board without full
    /// rows leaves the grid unchanged.
    fn clear_lines(&mut self) -> usize;

    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    fn inside(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.cols() && (y as usize) < self.rows()
    }

    #[must_use]
    fn is_free(&self, x: i32, y: i32) -> bool {
        self.inside(x, y) && self.cell(x, y).is_none()
    }

    /// Returns `true` iff all four cells are inside the board and unoccupied.
    #[must_use]
    fn valid(&self, blocks: &PieceBlocks) -> bool {
        blocks.cells().iter().all(|&(x, y)| self.is_free(x, y))
    }

    /// Largest `dy >= 0` such that the piece moved down by `dy` stays valid.
    ///
    /// The sweep is bounded by the board height.
    #[must_use]
    fn drop_distance(&self, blocks: &PieceBlocks) -> i32 {
        let limit = i32::try_from(self.rows()).unwrap_or(i32::MAX);
        let mut dy = 0;
        while dy < limit && self.valid(&blocks.translated(0, dy + 1)) {
            dy += 1;
        }
        dy
    }
}

/// Classic rectangular well storing one optional color per cell.
///
/// Rows are stored top to bottom.
///
/// # Example
///
/// ```
/// use blockfall_engine::{Board, PieceBlocks, PieceKind, RectBoard, Rgb};
///
/// let mut board = RectBoard::new(4, 3).unwrap();
/// let bar = PieceBlocks::new(PieceKind::I, Rgb(0, 255, 255), [(0, 2), (1, 2), (2, 2), (3, 2)]);
///
/// assert!(board.valid(&bar));
/// assert_eq!(board.lock(&bar), 1);
/// assert_eq!(board.cell(0, 2), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RectBoard {
    cols: usize,
    grid: Vec<Vec<Option<Rgb>>>,
}

impl RectBoard {
    pub fn new(cols: usize, rows: usize) -> Result<Self, ConfigError> {
        if cols == 0 || rows == 0 || i32::try_from(cols.max(rows)).is_err() {
            return Err(ConfigError::InvalidBoardSize { cols, rows });
        }
        Ok(Self {
            cols,
            grid: vec![vec![None; cols]; rows],
        })
    }

    /// Builds a pre-filled board from text rows, top to bottom.
    ///
    /// `.` marks an empty cell; any other character is filled with `color`.
    /// All rows must have the same width.
    pub fn from_pattern(pattern: &[&str], color: Rgb) -> Result<Self, ConfigError> {
        let rows = pattern.len();
        let cols = pattern.first().map_or(0, |row| row.chars().count());
        let mut board = Self::new(cols, rows)?;
        for (y, line) in pattern.iter().enumerate() {
            if line.chars().count() != cols {
                return Err(ConfigError::InvalidBoardSize { cols, rows });
            }
            for (x, c) in line.chars().enumerate() {
                if c != '.' {
                    board.grid[y][x] = Some(color);
                }
            }
        }
        Ok(board)
    }

    /// Rows from top to bottom, for painting.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Option<Rgb>]> {
        self.grid.iter().map(Vec::as_slice)
    }

    /// Coordinates of every occupied cell.
    pub fn occupied_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.grid.iter().zip(0..).flat_map(|(row, y)| {
            row.iter()
                .zip(0..)
                .filter_map(move |(cell, x)| cell.map(|_| (x, y)))
        })
    }

    fn is_full(row: &[Option<Rgb>]) -> bool {
        row.iter().all(Option::is_some)
    }
}

impl Board for RectBoard {
    fn cols(&self) -> usize {
        self.cols
    }

    fn rows(&self) -> usize {
        self.grid.len()
    }

    #[allow(clippy::cast_sign_loss)]
    fn cell(&self, x: i32, y: i32) -> Option<Rgb> {
        if !self.inside(x, y) {
            return None;
        }
        self.grid[y as usize][x as usize]
    }

    #[allow(clippy::cast_sign_loss)]
    fn lock(&mut self, blocks: &PieceBlocks) -> usize {
        for &(x, y) in blocks.cells() {
            if !self.inside(x, y) {
                continue;
            }
            self.grid[y as usize][x as usize] = Some(blocks.color());
        }
        self.clear_lines()
    }

    fn clear_lines(&mut self) -> usize {
        let height = self.grid.len();
        let mut count = 0;
        for y in (0..height).rev() {
            if Self::is_full(&self.grid[y]) {
                count += 1;
                continue;
            }
            if count > 0 {
                self.grid.swap(y, y + count);
            }
        }
        for row in &mut self.grid[..count] {
            row.fill(None);
        }
        count
    }
}

//! Occupancy-grid construction and board-coordinate ↔ grid-index conversion (C1, C4).

use geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::board::{Board, Zone};
use crate::error::{Error, Result};

/// The traversability state of a single grid cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    /// The cell may be entered by a trace.
    #[default]
    Free,
    /// The cell is occupied by a keep-out zone or another net's trace.
    Blocked,
}

/// A grid coordinate: `(col, row)`, `col` increasing with `+x`, `row` increasing with `−y`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    /// Column index.
    pub col: i64,
    /// Row index.
    pub row: i64,
}

impl GridIndex {
    /// Creates a new grid index.
    pub const fn new(col: i64, row: i64) -> Self {
        Self { col, row }
    }
}

/// The dense occupancy grid for a board, plus the conversions needed to place
/// zones, sockets, and paths onto it.
#[derive(Clone, Debug)]
pub struct RouterGrid {
    cells: grid::Grid<Cell>,
    /// Board width in grid cells.
    pub cols: usize,
    /// Board height in grid cells.
    pub rows: usize,
    resolution: f64,
}

impl RouterGrid {
    /// Allocates a `rows × cols` grid with every cell [`Cell::Free`].
    pub fn empty(cols: usize, rows: usize, resolution: f64) -> Result<Self> {
        if cols == 0 || rows == 0 {
            return Err(Error::InvalidGrid(
                "board must have positive width and height".to_string(),
            ));
        }
        Ok(Self {
            cells: grid::Grid::new(rows, cols),
            cols,
            rows,
            resolution,
        })
    }

    /// Builds the `base_grid` for a board: a grid with every module/bus zone marked blocked.
    ///
    /// Never mutated after construction; per-route masking always works on a [`RouterGrid::clone`].
    pub fn build(board: &Board) -> Result<Self> {
        let (cols, rows) = board.grid_dims();
        let mut grid = Self::empty(cols, rows, board.config.resolution)?;
        for zone in &board.zones {
            grid.mark_zone_blocked(zone);
        }
        Ok(grid)
    }

    /// Converts a board-space coordinate to a grid index (§4.1 coord→index).
    ///
    /// Rounding is half-to-even; a coordinate exactly on the grid produces an exact index.
    pub fn index_of(&self, p: Point) -> GridIndex {
        let wg = self.cols as f64;
        let hg = self.rows as f64;
        GridIndex::new(
            round_half_to_even(wg / 2.0 + p.x / self.resolution),
            round_half_to_even(hg / 2.0 - p.y / self.resolution),
        )
    }

    /// Converts a grid index back to a board-space coordinate (§4.1 index→coord).
    pub fn coord_of(&self, idx: GridIndex) -> Point {
        let wg = self.cols as f64;
        let hg = self.rows as f64;
        Point::new(
            (idx.col as f64 - wg / 2.0) * self.resolution,
            (hg / 2.0 - idx.row as f64) * self.resolution,
        )
    }

    /// Clamps a grid index into `[0, cols) × [0, rows)`.
    pub fn clamp(&self, idx: GridIndex) -> GridIndex {
        GridIndex::new(
            idx.col.clamp(0, self.cols as i64 - 1),
            idx.row.clamp(0, self.rows as i64 - 1),
        )
    }

    /// The resolution (millimeters per cell) this grid was built with.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Returns `true` if `idx` lies within grid bounds.
    pub fn in_bounds(&self, idx: GridIndex) -> bool {
        idx.col >= 0 && idx.row >= 0 && (idx.col as usize) < self.cols && (idx.row as usize) < self.rows
    }

    /// The state of the cell at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub fn get(&self, idx: GridIndex) -> Cell {
        self.cells[(idx.row as usize, idx.col as usize)]
    }

    /// Sets the state of the cell at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub fn set(&mut self, idx: GridIndex, cell: Cell) {
        self.cells[(idx.row as usize, idx.col as usize)] = cell;
    }

    /// Marks every cell enclosed by `zone`'s bounding rectangle (inclusive) as blocked,
    /// clamping the rectangle's corners into grid bounds.
    pub fn mark_zone_blocked(&mut self, zone: &Zone) {
        self.mark_rect_blocked(zone.bounds());
    }

    /// Marks every cell enclosed by `rect` (inclusive, in grid-index space) as blocked.
    pub fn mark_rect_blocked(&mut self, rect: Rect) {
        let bl = self.clamp(self.index_of(rect.bl));
        let tr = self.clamp(self.index_of(rect.tr));
        // index_of inverts y into row, so the rectangle's row order may need swapping.
        let (min_col, max_col) = (bl.col.min(tr.col), bl.col.max(tr.col));
        let (min_row, max_row) = (bl.row.min(tr.row), bl.row.max(tr.row));
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                self.set(GridIndex::new(col, row), Cell::Blocked);
            }
        }
    }
}

/// Rounds to the nearest integer, breaking ties to the nearest even integer.
fn round_half_to_even(v: f64) -> i64 {
    let floor = v.floor();
    let diff = v - floor;
    let floor_i = floor as i64;
    if diff < 0.5 {
        floor_i
    } else if diff > 0.5 {
        floor_i + 1
    } else if floor_i % 2 == 0 {
        floor_i
    } else {
        floor_i + 1
    }
}

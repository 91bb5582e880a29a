use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::core::error::ConsistencyError;

/// Smallest cell side as a fraction of the domain (at most 100 cells per axis).
const MAX_CELLS_PER_AXIS: f64 = 100.0;

/// Uniform grid over the periodic square, mapping each cell to the disks whose
/// center lies in it.
///
/// Cells are stored in a flat vector; access is O(1) via `index = cx * n + cy`.
/// The list only ever holds disk indices, never positions: callers pass the
/// position the disk had when it was (or will be) inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellList {
    domain_size: f64,
    cell_count: usize,
    cell_size: f64,
    cells: Vec<Vec<usize>>,
}

impl CellList {
    /// Builds an empty grid whose cell side is at least `min_cell_side`
    /// (and at least `domain_size / 100`), with a minimum of one cell.
    pub fn new(domain_size: f64, min_cell_side: f64) -> Self {
        let side = min_cell_side.max(domain_size / MAX_CELLS_PER_AXIS);
        let cell_count = if side > 0.0 {
            ((domain_size / side).floor() as usize).max(1)
        } else {
            1
        };
        Self::with_cell_count(domain_size, cell_count)
    }

    /// Builds an empty grid with an explicit number of cells per axis.
    pub fn with_cell_count(domain_size: f64, cell_count: usize) -> Self {
        let cell_count = cell_count.max(1);
        Self {
            domain_size,
            cell_count,
            cell_size: domain_size / cell_count as f64,
            cells: vec![Vec::new(); cell_count * cell_count],
        }
    }

    /// Builds the grid and indexes disk `i` at `positions[i]` for every `i`.
    pub fn from_positions(domain_size: f64, min_cell_side: f64, positions: &[Point2<f64>]) -> Self {
        let mut grid = Self::new(domain_size, min_cell_side);
        for (i, p) in positions.iter().enumerate() {
            let flat = grid.flat(grid.cell_of(p));
            grid.cells[flat].push(i);
        }
        grid
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell coordinates of a position. Always in `[0, cell_count)`, also for
    /// positions that rounding pushed slightly outside the box.
    #[inline]
    pub fn cell_of(&self, p: &Point2<f64>) -> (usize, usize) {
        (self.axis_cell(p.x), self.axis_cell(p.y))
    }

    #[inline]
    fn axis_cell(&self, x: f64) -> usize {
        let n = self.cell_count as i64;
        let c = (x * self.cell_count as f64 / self.domain_size).floor() as i64;
        c.rem_euclid(n) as usize
    }

    #[inline]
    fn flat(&self, cell: (usize, usize)) -> usize {
        cell.0 * self.cell_count + cell.1
    }

    /// Disk indices stored in a cell. Coordinates are taken modulo the grid.
    pub fn cell(&self, cx: usize, cy: usize) -> &[usize] {
        let cell = (cx % self.cell_count, cy % self.cell_count);
        &self.cells[self.flat(cell)]
    }

    pub fn insert(&mut self, index: usize, p: &Point2<f64>) -> Result<(), ConsistencyError> {
        let cell = self.cell_of(p);
        let flat = self.flat(cell);
        if self.cells[flat].contains(&index) {
            return Err(ConsistencyError::AlreadyIndexed { index, cell });
        }
        self.cells[flat].push(index);
        Ok(())
    }

    /// Removes `index` from the cell of `p`, which must be the position the
    /// disk had when it was inserted.
    pub fn remove(&mut self, index: usize, p: &Point2<f64>) -> Result<(), ConsistencyError> {
        let cell = self.cell_of(p);
        let flat = self.flat(cell);
        let slot = self.cells[flat]
            .iter()
            .position(|&i| i == index)
            .ok_or(ConsistencyError::NotInCell { index, cell })?;
        self.cells[flat].swap_remove(slot);
        Ok(())
    }

    #[inline]
    pub fn contains(&self, index: usize, p: &Point2<f64>) -> bool {
        self.cells[self.flat(self.cell_of(p))].contains(&index)
    }

    /// Total number of stored entries across all cells.
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }

    /// Iterates over `((cx, cy), indices)` for every cell.
    pub fn iter_cells(&self) -> impl Iterator<Item = ((usize, usize), &[usize])> + '_ {
        let n = self.cell_count;
        self.cells
            .iter()
            .enumerate()
            .map(move |(flat, c)| ((flat / n, flat % n), c.as_slice()))
    }

    /// Collects the distinct disk indices in the square window of half-width
    /// `ring` cells around `center`. The window is clamped to the grid so that
    /// it never visits a cell twice.
    pub fn collect_window(&self, center: (usize, usize), ring: usize, out: &mut Vec<usize>) {
        let n = self.cell_count;
        let span = (2 * ring + 1).min(n);
        // Start so that the clamped window stays centered when possible.
        let half = (span - 1) / 2;
        let start_x = (center.0 + n - half % n) % n;
        let start_y = (center.1 + n - half % n) % n;

        for dx in 0..span {
            let cx = (start_x + dx) % n;
            for dy in 0..span {
                let cy = (start_y + dy) % n;
                out.extend_from_slice(&self.cells[cx * n + cy]);
            }
        }
        // Cells are disjoint, but be strict about duplicates anyway.
        out.sort_unstable();
        out.dedup();
    }
}

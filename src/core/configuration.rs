use std::f64::consts::PI;

use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::core::cell_list::CellList;
use crate::core::domain::{DiskKind, SimulationParams, LARGE_RADIUS, OVERLAP_TOLERANCE};
use crate::core::error::{ConfigError, ConsistencyError};
use crate::core::spatial;

/// The simulated packing: `N` large disks (indices `0..N`) followed by `n`
/// small disks (indices `N..N+n`) in a periodic square, plus the cell list
/// kept in sync with their positions.
///
/// Positions are only changed by the cluster engine, through [`Configuration::reflect`],
/// while the disk is detached from the cell list.
#[derive(Debug, Clone)]
pub struct Configuration {
    domain_size: f64,
    large_count: usize,
    small_count: usize,
    small_radius: f64,
    positions: Vec<Point2<f64>>,
    radii: Vec<f64>,
    cells: CellList,
}

/// Owned, read-only copy of a configuration taken between two moves.
/// This is what leaves the worker thread and what gets written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSnapshot {
    pub domain_size: f64,
    pub large_count: usize,
    pub small_count: usize,
    pub small_radius: f64,
    pub positions: Vec<Point2<f64>>,
    pub radii: Vec<f64>,
}

impl DiskSnapshot {
    pub fn kind(&self, index: usize) -> DiskKind {
        if index < self.large_count { DiskKind::Large } else { DiskKind::Small }
    }
}

fn check_packing_inputs(small_radius: f64, domain_size: f64) -> Result<(), ConfigError> {
    if !(small_radius > 0.0 && small_radius <= LARGE_RADIUS) {
        return Err(ConfigError::UnsupportedRadius(small_radius));
    }
    if !(domain_size.is_finite() && domain_size > 0.0) {
        return Err(ConfigError::InvalidDomainSize(domain_size));
    }
    Ok(())
}

/// Row-major placement of `count` disks of radius `radius` on rows of pitch
/// `2 * radius`. Returns (centers x-pitch, columns, rows).
fn row_layout(count: usize, radius: f64, domain_size: f64) -> (f64, usize, usize) {
    let cols = (domain_size / (2.0 * radius)).floor() as usize;
    if cols == 0 || count == 0 {
        return (0.0, cols, if count == 0 { 0 } else { usize::MAX });
    }
    let rows = count.div_ceil(cols);
    (domain_size / cols as f64, cols, rows)
}

impl Configuration {
    /// Deterministic lattice start: large disks fill rows from the bottom of the
    /// box, small disks fill rows from the top down. Fails when the two bands
    /// cannot fit without overlapping.
    pub fn create(
        large_count: usize,
        small_count: usize,
        small_radius: f64,
        domain_size: f64,
    ) -> Result<Self, ConfigError> {
        check_packing_inputs(small_radius, domain_size)?;

        let (pitch_l, cols_l, rows_l) = row_layout(large_count, LARGE_RADIUS, domain_size);
        let (pitch_s, cols_s, rows_s) = row_layout(small_count, small_radius, domain_size);

        let infeasible = || ConfigError::PlacementInfeasible {
            large: large_count,
            small: small_count,
            domain: domain_size,
            needed: 2.0 * LARGE_RADIUS * rows_l as f64 + 2.0 * small_radius * rows_s as f64,
        };
        if rows_l == usize::MAX || rows_s == usize::MAX {
            return Err(infeasible());
        }
        let band_height =
            2.0 * LARGE_RADIUS * rows_l as f64 + 2.0 * small_radius * rows_s as f64;
        if band_height > domain_size + OVERLAP_TOLERANCE {
            return Err(infeasible());
        }

        let mut positions = Vec::with_capacity(large_count + small_count);
        for i in 0..large_count {
            let (row, col) = (i / cols_l, i % cols_l);
            positions.push(Point2::new(
                (col as f64 + 0.5) * pitch_l,
                LARGE_RADIUS + 2.0 * LARGE_RADIUS * row as f64,
            ));
        }
        for i in 0..small_count {
            let (row, col) = (i / cols_s, i % cols_s);
            let y = domain_size - small_radius - 2.0 * small_radius * row as f64;
            positions.push(Point2::new((col as f64 + 0.5) * pitch_s, y));
        }

        debug!(
            "lattice start: {large_count} large in {rows_l} rows, {small_count} small in {rows_s} rows, L = {domain_size}"
        );
        Self::assemble(large_count, small_count, small_radius, domain_size, positions)
    }

    /// Same as [`Configuration::create`] with the box side derived from a
    /// target packing fraction: `L = ceil(sqrt(total disk area / density))`.
    pub fn from_density(
        large_count: usize,
        small_count: usize,
        small_radius: f64,
        density: f64,
    ) -> Result<Self, ConfigError> {
        if !(density > 0.0 && density <= 1.0) {
            return Err(ConfigError::InvalidDensity(density));
        }
        let area = PI
            * (large_count as f64 * LARGE_RADIUS * LARGE_RADIUS
                + small_count as f64 * small_radius * small_radius);
        let domain_size = (area / density).sqrt().ceil();
        Self::create(large_count, small_count, small_radius, domain_size)
    }

    pub fn from_params(params: &SimulationParams) -> Result<Self, ConfigError> {
        params.validate()?;
        match params.domain_size {
            Some(l) => Self::create(params.large_count, params.small_count, params.small_radius, l),
            None => Self::from_density(
                params.large_count,
                params.small_count,
                params.small_radius,
                params.density,
            ),
        }
    }

    /// Builds a configuration from explicit centers (wrapped into the box).
    /// Rejects inputs where any two disks overlap.
    pub fn with_positions(
        large_count: usize,
        small_count: usize,
        small_radius: f64,
        domain_size: f64,
        positions: Vec<Point2<f64>>,
    ) -> Result<Self, ConfigError> {
        check_packing_inputs(small_radius, domain_size)?;
        let expected = large_count + small_count;
        if positions.len() != expected {
            return Err(ConfigError::LengthMismatch { expected, actual: positions.len() });
        }
        let positions: Vec<_> = positions
            .iter()
            .map(|p| spatial::wrap_into_box(p, domain_size))
            .collect();
        Self::assemble(large_count, small_count, small_radius, domain_size, positions)
    }

    pub fn from_snapshot(snapshot: &DiskSnapshot) -> Result<Self, ConfigError> {
        Self::with_positions(
            snapshot.large_count,
            snapshot.small_count,
            snapshot.small_radius,
            snapshot.domain_size,
            snapshot.positions.clone(),
        )
    }

    fn assemble(
        large_count: usize,
        small_count: usize,
        small_radius: f64,
        domain_size: f64,
        positions: Vec<Point2<f64>>,
    ) -> Result<Self, ConfigError> {
        let radii: Vec<f64> = (0..large_count + small_count)
            .map(|i| if i < large_count { LARGE_RADIUS } else { small_radius })
            .collect();

        if let Some((a, b)) =
            spatial::find_any_overlap(&positions, &radii, domain_size, OVERLAP_TOLERANCE)
        {
            return Err(ConfigError::PositionOverlap { a, b });
        }

        let cells = CellList::from_positions(domain_size, 2.0 * small_radius, &positions);

        Ok(Self {
            domain_size,
            large_count,
            small_count,
            small_radius,
            positions,
            radii,
            cells,
        })
    }

    // --- Read accessors ---

    pub fn domain_size(&self) -> f64 {
        self.domain_size
    }

    pub fn large_count(&self) -> usize {
        self.large_count
    }

    pub fn small_count(&self) -> usize {
        self.small_count
    }

    pub fn small_radius(&self) -> f64 {
        self.small_radius
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn position(&self, index: usize) -> &Point2<f64> {
        &self.positions[index]
    }

    #[inline]
    pub fn radius(&self, index: usize) -> f64 {
        self.radii[index]
    }

    pub fn positions(&self) -> &[Point2<f64>] {
        &self.positions
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    #[inline]
    pub fn kind(&self, index: usize) -> DiskKind {
        if index < self.large_count { DiskKind::Large } else { DiskKind::Small }
    }

    pub fn cell_list(&self) -> &CellList {
        &self.cells
    }

    /// Packing fraction actually realised by this box.
    pub fn density(&self) -> f64 {
        let area: f64 = self.radii.iter().map(|r| PI * r * r).sum();
        area / (self.domain_size * self.domain_size)
    }

    pub fn snapshot(&self) -> DiskSnapshot {
        DiskSnapshot {
            domain_size: self.domain_size,
            large_count: self.large_count,
            small_count: self.small_count,
            small_radius: self.small_radius,
            positions: self.positions.clone(),
            radii: self.radii.clone(),
        }
    }

    // --- Index maintenance (cluster engine only) ---

    /// True while the disk sits in the cell list under its current position.
    #[inline]
    pub fn is_indexed(&self, index: usize) -> bool {
        self.cells.contains(index, &self.positions[index])
    }

    /// Cell the disk's current position maps to.
    #[inline]
    pub fn cell_of(&self, index: usize) -> (usize, usize) {
        self.cells.cell_of(&self.positions[index])
    }

    /// Takes a disk out of the cell list. Must be called before its position changes.
    pub(crate) fn detach(&mut self, index: usize) -> Result<(), ConsistencyError> {
        self.cells.remove(index, &self.positions[index])
    }

    /// Puts a disk back under the cell of its current position.
    pub(crate) fn attach(&mut self, index: usize) -> Result<(), ConsistencyError> {
        self.cells.insert(index, &self.positions[index])
    }

    /// Point reflection of a detached disk about `pivot`.
    #[inline]
    pub(crate) fn reflect(&mut self, index: usize, pivot: &Point2<f64>) {
        self.positions[index] = spatial::periodic_reflect(&self.positions[index], pivot, self.domain_size);
    }

    // --- Diagnostics ---

    /// Checks that every disk is stored exactly once, under the cell of its
    /// current position.
    pub fn verify_index(&self) -> Result<(), ConsistencyError> {
        let mut seen = vec![false; self.len()];
        for (cell, indices) in self.cells.iter_cells() {
            for &i in indices {
                if i >= self.len() || seen[i] || self.cells.cell_of(&self.positions[i]) != cell {
                    return Err(ConsistencyError::AlreadyIndexed { index: i, cell });
                }
                seen[i] = true;
            }
        }
        match seen.iter().position(|s| !s) {
            Some(index) => Err(ConsistencyError::NotInCell { index, cell: self.cell_of(index) }),
            None => Ok(()),
        }
    }

    /// First pair of intersecting disks, if any (brute force).
    pub fn find_overlapping_pair(&self) -> Option<(usize, usize)> {
        spatial::find_any_overlap(&self.positions, &self.radii, self.domain_size, OVERLAP_TOLERANCE)
    }
}

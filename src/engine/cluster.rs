use std::collections::VecDeque;

use nalgebra::Point2;

use crate::core::configuration::Configuration;
use crate::core::error::ConsistencyError;
use crate::engine::overlap::{find_overlaps, NeighbourScan};

/// Outcome of one cluster move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveReport {
    pub seed: usize,
    pub pivot: Point2<f64>,
    /// Every disk reflected by the move, in the order it joined the cluster.
    pub moved: Vec<usize>,
    /// How many of `moved` were absorbed as fully covered (never scanned).
    pub covered: usize,
}

impl MoveReport {
    pub fn cluster_size(&self) -> usize {
        self.moved.len()
    }
}

/// Pivot cluster move: reflects `seed` about `pivot`, then every disk the
/// reflected disks land on, until nothing pending overlaps anything.
///
/// Disks leave the cell list when they join the cluster and all of them are
/// put back only after the last reflection, so overlap queries never see a
/// mix of pre- and post-move positions. Pending disks are processed last-in
/// first-out. A disk fully covered by the disk that found it is reflected
/// immediately and not scanned on its own.
///
/// On `Err` the cell list is left inconsistent and the configuration must be
/// discarded.
pub fn cluster_move(
    cfg: &mut Configuration,
    seed: usize,
    pivot: &Point2<f64>,
    scan: &NeighbourScan,
) -> Result<MoveReport, ConsistencyError> {
    let mut pending: VecDeque<usize> = VecDeque::new();
    let mut moved = Vec::new();
    let mut covered = 0;

    cfg.detach(seed)?;
    moved.push(seed);
    pending.push_back(seed);

    while let Some(disk) = pending.pop_back() {
        cfg.reflect(disk, pivot);

        for overlap in find_overlaps(cfg, disk, scan)? {
            cfg.detach(overlap.other)?;
            moved.push(overlap.other);
            if overlap.fully_covered {
                cfg.reflect(overlap.other, pivot);
                covered += 1;
            } else {
                pending.push_back(overlap.other);
            }
        }
    }

    for &disk in &moved {
        cfg.attach(disk)?;
    }

    Ok(MoveReport {
        seed,
        pivot: *pivot,
        moved,
        covered,
    })
}

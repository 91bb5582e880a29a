use nalgebra::Point2;
use rand::Rng;

use crate::core::configuration::Configuration;
use crate::core::domain::MovePolicy;
use crate::core::error::{ConfigError, SimError};
use crate::engine::cluster::{cluster_move, MoveReport};
use crate::engine::overlap::NeighbourScan;

/// Pivot drawn uniformly from `[0, L)²`.
pub fn random_pivot<R: Rng + ?Sized>(domain_size: f64, rng: &mut R) -> Point2<f64> {
    Point2::new(rng.gen_range(0.0..domain_size), rng.gen_range(0.0..domain_size))
}

/// Cluster move seeded by a disk drawn uniformly from all `N + n` disks.
pub fn perform_random_move<R: Rng + ?Sized>(
    cfg: &mut Configuration,
    rng: &mut R,
    scan: &NeighbourScan,
) -> Result<MoveReport, SimError> {
    if cfg.is_empty() {
        return Err(ConfigError::NoEligibleSeed.into());
    }
    let seed = rng.gen_range(0..cfg.len());
    let pivot = random_pivot(cfg.domain_size(), rng);
    Ok(cluster_move(cfg, seed, &pivot, scan)?)
}

/// Cluster move seeded by a disk drawn uniformly from the `N` large disks.
pub fn perform_large_disk_move<R: Rng + ?Sized>(
    cfg: &mut Configuration,
    rng: &mut R,
    scan: &NeighbourScan,
) -> Result<MoveReport, SimError> {
    if cfg.large_count() == 0 {
        return Err(ConfigError::NoEligibleSeed.into());
    }
    let seed = rng.gen_range(0..cfg.large_count());
    let pivot = random_pivot(cfg.domain_size(), rng);
    Ok(cluster_move(cfg, seed, &pivot, scan)?)
}

pub fn perform_move<R: Rng + ?Sized>(
    policy: MovePolicy,
    cfg: &mut Configuration,
    rng: &mut R,
    scan: &NeighbourScan,
) -> Result<MoveReport, SimError> {
    match policy {
        MovePolicy::RandomDisk => perform_random_move(cfg, rng, scan),
        MovePolicy::LargeDisk => perform_large_disk_move(cfg, rng, scan),
    }
}

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::configuration::Configuration;
use crate::core::spatial;
use crate::engine::cluster::MoveReport;

/// Mean minimum-image distance over all unordered pairs of large disks.
/// `None` with fewer than two large disks.
pub fn average_pair_distance(cfg: &Configuration) -> Option<f64> {
    let n = cfg.large_count();
    if n < 2 {
        return None;
    }
    let l = cfg.domain_size();
    let positions = &cfg.positions()[..n];

    let total: f64 = (0..n)
        .into_par_iter()
        .map(|i| {
            positions[i + 1..]
                .iter()
                .map(|q| spatial::periodic_distance(&positions[i], q, l))
                .sum::<f64>()
        })
        .sum();

    let pairs = (n * (n - 1) / 2) as f64;
    Some(total / pairs)
}

/// Summary of a batch of scalar measurements.
/// `std_dev` is the population standard deviation (divides by `count`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl BatchSummary {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let count = samples.len();
        let mean = samples.iter().sum::<f64>() / count as f64;
        let var = samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / count as f64;
        let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some(Self { count, mean, std_dev: var.sqrt(), min, max })
    }
}

/// Running counters over cluster moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveTally {
    pub moves: u64,
    pub disks_moved: u64,
    pub covered: u64,
    pub largest_cluster: usize,
}

impl MoveTally {
    pub fn record(&mut self, report: &MoveReport) {
        self.moves += 1;
        self.disks_moved += report.cluster_size() as u64;
        self.covered += report.covered as u64;
        self.largest_cluster = self.largest_cluster.max(report.cluster_size());
    }

    pub fn mean_cluster_size(&self) -> f64 {
        if self.moves == 0 { 0.0 } else { self.disks_moved as f64 / self.moves as f64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    #[test]
    fn pair_distance_of_three_disks() {
        // Right triangle 3-4-5 well inside a large box
        let cfg = Configuration::with_positions(
            3,
            0,
            0.1,
            40.0,
            vec![Point2::new(10.0, 10.0), Point2::new(13.0, 10.0), Point2::new(10.0, 14.0)],
        )
        .unwrap();
        let d = average_pair_distance(&cfg).unwrap();
        assert!((d - 4.0).abs() < 1e-12);
    }

    #[test]
    fn pair_distance_ignores_small_disks_and_wraps() {
        let cfg = Configuration::with_positions(
            2,
            1,
            0.1,
            10.0,
            vec![Point2::new(1.0, 5.0), Point2::new(8.0, 5.0), Point2::new(5.0, 5.0)],
        )
        .unwrap();
        assert!((average_pair_distance(&cfg).unwrap() - 3.0).abs() < 1e-12);

        let single =
            Configuration::with_positions(1, 0, 0.1, 10.0, vec![Point2::new(1.0, 1.0)]).unwrap();
        assert_eq!(average_pair_distance(&single), None);
    }

    #[test]
    fn summary_uses_population_std() {
        let s = BatchSummary::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.count, 8);
        assert!((s.mean - 5.0).abs() < 1e-12);
        assert!((s.std_dev - 2.0).abs() < 1e-12);
        assert_eq!((s.min, s.max), (2.0, 9.0));
        assert_eq!(BatchSummary::from_samples(&[]), None);
    }

    #[test]
    fn tally_tracks_cluster_sizes() {
        let mut tally = MoveTally::default();
        let report = |moved: Vec<usize>, covered| MoveReport {
            seed: moved[0],
            pivot: Point2::origin(),
            moved,
            covered,
        };
        tally.record(&report(vec![0], 0));
        tally.record(&report(vec![1, 2, 3], 1));
        assert_eq!(tally.moves, 2);
        assert_eq!(tally.largest_cluster, 3);
        assert_eq!(tally.covered, 1);
        assert!((tally.mean_cluster_size() - 2.0).abs() < 1e-12);
    }
}

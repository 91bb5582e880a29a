use crate::core::configuration::Configuration;
use crate::core::error::ConsistencyError;
use crate::core::spatial;

/// One disk found to intersect the disk being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub other: usize,
    /// `other` lies entirely inside the query disk.
    pub fully_covered: bool,
}

/// Tuning of the cell window scanned around a disk.
///
/// The window half-width (in cells) for a disk of radius `R` is
/// `ceil(R / cell) + ceil(r / cell) + ring_margin`, or a single ring for a
/// small disk whose diameter fits in one cell. Any margin keeps
/// `ring * cell >= R + r`, the distance at which a small disk can still touch
/// the query disk; large disks are never looked up through the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighbourScan {
    pub ring_margin: usize,
}

impl Default for NeighbourScan {
    fn default() -> Self {
        Self { ring_margin: 1 }
    }
}

impl NeighbourScan {
    pub fn new(ring_margin: usize) -> Self {
        Self { ring_margin }
    }

    /// Window half-width in cells for a disk of `radius`.
    pub fn ring_width(&self, radius: f64, small_radius: f64, cell_size: f64) -> usize {
        if 2.0 * radius < cell_size && radius <= small_radius {
            return 1;
        }
        let own = (radius / cell_size).ceil() as usize;
        let partner = (small_radius / cell_size).ceil() as usize;
        own + partner + self.ring_margin
    }
}

/// Pairwise classification of disk `target` against the query disk `index`.
#[inline]
fn classify(cfg: &Configuration, index: usize, target: usize) -> Option<Overlap> {
    let r_i = cfg.radius(index);
    let r_t = cfg.radius(target);
    let d = spatial::periodic_distance(cfg.position(index), cfg.position(target), cfg.domain_size());
    if d >= r_i + r_t {
        return None;
    }
    Some(Overlap {
        other: target,
        fully_covered: d + r_t < r_i,
    })
}

/// All disks currently in the cell list that intersect disk `index` at its
/// current position.
///
/// Small disks are found through the cell window around the query disk. Large
/// disks are always checked exhaustively against every large disk still in
/// the list, since one large disk can reach well past the window.
/// The query disk itself must already be detached.
pub fn find_overlaps(
    cfg: &Configuration,
    index: usize,
    scan: &NeighbourScan,
) -> Result<Vec<Overlap>, ConsistencyError> {
    if cfg.is_indexed(index) {
        return Err(ConsistencyError::SeedStillIndexed { index, cell: cfg.cell_of(index) });
    }

    let cells = cfg.cell_list();
    let ring = scan.ring_width(cfg.radius(index), cfg.small_radius(), cells.cell_size());
    debug_assert!(
        ring as f64 * cells.cell_size() >= cfg.radius(index) + cfg.small_radius()
            || 2 * ring + 1 >= cells.cell_count()
    );

    let mut window = Vec::new();
    cells.collect_window(cfg.cell_of(index), ring, &mut window);

    let large_count = cfg.large_count();
    let mut overlaps = Vec::new();

    for &target in window.iter().filter(|&&t| t >= large_count) {
        if target == index {
            return Err(ConsistencyError::SelfOverlap { index });
        }
        if let Some(o) = classify(cfg, index, target) {
            overlaps.push(o);
        }
    }

    for target in 0..large_count {
        if target == index || !cfg.is_indexed(target) {
            continue;
        }
        if let Some(o) = classify(cfg, index, target) {
            overlaps.push(o);
        }
    }

    Ok(overlaps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn pair(large: Point2<f64>, small: Point2<f64>, r: f64) -> Configuration {
        Configuration::with_positions(1, 1, r, 10.0, vec![large, small]).unwrap()
    }

    #[test]
    fn ring_width_cases() {
        let scan = NeighbourScan::default();
        // Small disk fits in one cell
        assert_eq!(scan.ring_width(0.1, 0.1, 0.25), 1);
        // Large disk: ceil(1 / 0.25) + ceil(0.1 / 0.25) + 1
        assert_eq!(scan.ring_width(1.0, 0.1, 0.25), 6);
        // Small disk larger than a cell
        assert_eq!(scan.ring_width(0.4, 0.4, 0.25), 2 + 2 + 1);
        assert_eq!(NeighbourScan::new(0).ring_width(1.0, 0.1, 0.25), 5);
    }

    #[test]
    fn detects_partial_and_full_cover() {
        let mut cfg = pair(Point2::new(2.0, 2.0), Point2::new(5.0, 5.0), 0.2);
        cfg.detach(0).unwrap();

        // Large disk lands at (5.2, 5.0), the small one sits well inside it
        cfg.reflect(0, &Point2::new(3.6, 3.5));
        let found = find_overlaps(&cfg, 0, &NeighbourScan::default()).unwrap();
        assert_eq!(found, vec![Overlap { other: 1, fully_covered: true }]);

        // Small disk straddling the rim: partial overlap
        let mut cfg = pair(Point2::new(2.0, 2.0), Point2::new(3.4, 2.0), 0.2);
        cfg.detach(0).unwrap();
        let found = find_overlaps(&cfg, 0, &NeighbourScan::default()).unwrap();
        assert!(found.is_empty());
        cfg.reflect(0, &Point2::new(2.25, 2.0)); // large center now at (2.5, 2.0)
        let found = find_overlaps(&cfg, 0, &NeighbourScan::default()).unwrap();
        assert_eq!(found, vec![Overlap { other: 1, fully_covered: false }]);
    }

    #[test]
    fn large_disks_found_across_the_boundary() {
        let mut cfg = Configuration::with_positions(
            2,
            0,
            0.1,
            10.0,
            vec![Point2::new(1.0, 5.0), Point2::new(5.0, 5.0)],
        )
        .unwrap();
        cfg.detach(1).unwrap();
        // Reflect disk 1 to (9.5, 5.0): 1.5 away from disk 0 through the wrap
        cfg.reflect(1, &Point2::new(7.25, 5.0));
        let found = find_overlaps(&cfg, 1, &NeighbourScan::default()).unwrap();
        assert_eq!(found, vec![Overlap { other: 0, fully_covered: false }]);
    }

    #[test]
    fn detached_disks_are_invisible() {
        let mut cfg = Configuration::with_positions(
            2,
            0,
            0.1,
            10.0,
            vec![Point2::new(2.0, 5.0), Point2::new(5.0, 5.0)],
        )
        .unwrap();
        cfg.detach(0).unwrap();
        cfg.detach(1).unwrap();
        cfg.reflect(1, &Point2::new(3.5, 5.0)); // onto (2.0, 5.0)
        let found = find_overlaps(&cfg, 1, &NeighbourScan::default()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn query_disk_must_be_detached() {
        let cfg = pair(Point2::new(2.0, 2.0), Point2::new(5.0, 5.0), 0.2);
        let err = find_overlaps(&cfg, 1, &NeighbourScan::default()).unwrap_err();
        assert!(matches!(err, ConsistencyError::SeedStillIndexed { index: 1, .. }));
    }

    #[test]
    fn small_query_finds_neighbour_in_window() {
        // Three small disks in a row, the middle one is moved
        let positions = vec![
            Point2::new(4.0, 4.0),
            Point2::new(4.5, 4.0),
            Point2::new(5.0, 4.0),
        ];
        let mut cfg = Configuration::with_positions(0, 3, 0.2, 10.0, positions).unwrap();
        cfg.detach(1).unwrap();
        cfg.reflect(1, &Point2::new(4.5, 4.0)); // fixed point
        // Nudge through a reflection that lands 0.3 from disk 2
        cfg.reflect(1, &Point2::new(4.6, 4.0)); // (4.7, 4.0)
        let found = find_overlaps(&cfg, 1, &NeighbourScan::default()).unwrap();
        assert_eq!(found, vec![Overlap { other: 2, fully_covered: false }]);
    }
}

use crate::core::configuration::DiskSnapshot;
use crate::core::domain::DiskKind;

/// One drawable copy of a disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskImage {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub kind: DiskKind,
}

/// Every copy of every disk, shifted by `{-L, 0, L}` per axis, that is at
/// least partly visible in the square `[0, L]²`. Disks straddling an edge
/// therefore appear on both sides.
pub fn periodic_images(snapshot: &DiskSnapshot) -> Vec<DiskImage> {
    let l = snapshot.domain_size;
    let mut images = Vec::with_capacity(snapshot.positions.len());

    for (index, (p, &radius)) in snapshot.positions.iter().zip(&snapshot.radii).enumerate() {
        let visible = |z: f64| -radius < z && z < l + radius;
        let xs = [p.x - l, p.x, p.x + l];
        let ys = [p.y - l, p.y, p.y + l];
        for &x in xs.iter().filter(|&&x| visible(x)) {
            for &y in ys.iter().filter(|&&y| visible(y)) {
                images.push(DiskImage { index, x, y, radius, kind: snapshot.kind(index) });
            }
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::configuration::Configuration;
    use nalgebra::Point2;

    #[test]
    fn interior_disk_has_one_image() {
        let cfg =
            Configuration::with_positions(1, 0, 0.1, 10.0, vec![Point2::new(5.0, 5.0)]).unwrap();
        let images = periodic_images(&cfg.snapshot());
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].kind, DiskKind::Large);
    }

    #[test]
    fn corner_disk_is_drawn_four_times() {
        let cfg = Configuration::with_positions(
            1,
            1,
            0.2,
            10.0,
            vec![Point2::new(0.5, 9.6), Point2::new(5.0, 0.1)],
        )
        .unwrap();
        let images = periodic_images(&cfg.snapshot());
        let large: Vec<_> = images.iter().filter(|d| d.index == 0).collect();
        assert_eq!(large.len(), 4);
        assert!(large.iter().any(|d| (d.x - 10.5).abs() < 1e-12 && (d.y + 0.4).abs() < 1e-12));

        // Small disk touching the bottom edge also shows at the top
        let small: Vec<_> = images.iter().filter(|d| d.index == 1).collect();
        assert_eq!(small.len(), 2);
        assert!(small.iter().all(|d| d.kind == DiskKind::Small));
    }
}

use nalgebra::Point2;

/// Wraps a single coordinate into `[0, l)`.
///
/// `rem_euclid` can round a tiny negative input up to exactly `l`; that case
/// is folded back to `0.0` so the half-open interval always holds.
#[inline]
pub fn wrap_coord(x: f64, l: f64) -> f64 {
    let w = x.rem_euclid(l);
    if w >= l { 0.0 } else { w }
}

/// Moves a point into the primary box `[0, l)²`.
#[inline]
pub fn wrap_into_box(p: &Point2<f64>, l: f64) -> Point2<f64> {
    Point2::new(wrap_coord(p.x, l), wrap_coord(p.y, l))
}

/// Minimum-image displacement along one axis.
#[inline]
fn axis_delta(a: f64, b: f64, l: f64) -> f64 {
    let d = (a - b).abs();
    d.min(l - d)
}

/// Squared distance between two points under the Minimum Image Convention.
#[inline]
pub fn periodic_distance_sq(a: &Point2<f64>, b: &Point2<f64>, l: f64) -> f64 {
    let dx = axis_delta(a.x, b.x, l);
    let dy = axis_delta(a.y, b.y, l);
    dx * dx + dy * dy
}

/// Shortest distance between two points on the periodic square of side `l`.
#[inline]
pub fn periodic_distance(a: &Point2<f64>, b: &Point2<f64>, l: f64) -> f64 {
    periodic_distance_sq(a, b, l).sqrt()
}

/// Point reflection (180° rotation) of `point` about `pivot`, wrapped into the box.
///
/// Reflecting twice about the same pivot returns the original point modulo `l`.
#[inline]
pub fn periodic_reflect(point: &Point2<f64>, pivot: &Point2<f64>, l: f64) -> Point2<f64> {
    Point2::new(
        wrap_coord(2.0 * pivot.x - point.x, l),
        wrap_coord(2.0 * pivot.y - point.y, l),
    )
}

/// Brute-force scan for any pair of disks that intersect.
/// Returns the first offending pair, `None` if the packing is valid.
///
/// `tolerance` is subtracted from the contact distance so that touching
/// disks (distance equal to the radius sum up to rounding) are not flagged.
pub fn find_any_overlap(
    positions: &[Point2<f64>],
    radii: &[f64],
    l: f64,
    tolerance: f64,
) -> Option<(usize, usize)> {
    let n = positions.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let contact = radii[i] + radii[j] - tolerance;
            if periodic_distance_sq(&positions[i], &positions[j], l) < contact * contact {
                return Some((i, j));
            }
        }
    }
    None
}

//! Planar joint-angle geometry.

/// A point in normalised image coordinates.
pub type Point = (f64, f64);

/// Vectors shorter than this are treated as degenerate.
const MIN_VECTOR_NORM: f64 = 1e-9;

/// Angle at vertex `b` formed by `a` and `c`, in degrees within `[0, 180]`.
///
/// Returns `0.0` if either arm of the angle has (near) zero length.
pub fn calculate_angle(a: Point, b: Point, c: Point) -> f64 {
    let ba = (a.0 - b.0, a.1 - b.1);
    let bc = (c.0 - b.0, c.1 - b.1);

    let norm_ba = ba.0.hypot(ba.1);
    let norm_bc = bc.0.hypot(bc.1);
    if norm_ba < MIN_VECTOR_NORM || norm_bc < MIN_VECTOR_NORM {
        return 0.0;
    }

    let cos = (ba.0 * bc.0 + ba.1 * bc.1) / (norm_ba * norm_bc);
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Midpoint of two points.
pub fn midpoint(a: Point, b: Point) -> Point {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

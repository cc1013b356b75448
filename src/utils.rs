//! Geometric helpers shared by the DLT solver.

use nalgebra::Matrix3;

use crate::types::Point2D;

/// Whether `a`, `b`, `c` lie on a common line.
///
/// Compares twice the triangle area against `tolerance` times the product of
/// the two edge lengths from `a`, which makes the test independent of the
/// coordinate scale. Coincident points count as collinear.
pub fn are_collinear(a: &Point2D, b: &Point2D, c: &Point2D, tolerance: f64) -> bool {
    let ab = b - a;
    let ac = c - a;
    let cross = ab.x * ac.y - ab.y * ac.x;
    let scale = ab.norm() * ac.norm();
    if scale == 0.0 {
        return true;
    }
    cross.abs() <= tolerance * scale
}

/// Whether any three of `points` are collinear.
pub fn has_collinear_triple(points: &[Point2D], tolerance: f64) -> bool {
    let n = points.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                if are_collinear(&points[i], &points[j], &points[k], tolerance) {
                    return true;
                }
            }
        }
    }
    false
}

/// Hartley normalization: translate the centroid to the origin and scale so
/// that the mean distance from it is `sqrt(2)`.
///
/// Returns the normalized points and the similarity `T` with `p' = T p`, or
/// `None` if all points coincide.
pub fn normalize_points(points: &[Point2D]) -> Option<(Vec<Point2D>, Matrix3<f64>)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let (cx, cy) = (sx / n, sy / n);

    let mean_dist = points
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if mean_dist < 1e-10 {
        return None;
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = points
        .iter()
        .map(|p| Point2D::new((p.x - cx) * s, (p.y - cy) * s))
        .collect();
    Some((normalized, t))
}

//! Natural cubic spline through ordered points, expressed as Bézier segments.
//!
//! The spline has continuous first and second derivatives and zero curvature
//! at both ends. It is not monotone: it may overshoot between points.

use crate::ir::CubicSegment;

/// Solve the natural-spline tridiagonal system for one coordinate.
/// Returns the first and second control coordinates of each of the n-1 segments.
fn control_points(x: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = x.len() - 1;
    let mut a = vec![0.0; n];
    let mut b = vec![0.0; n];
    let mut r = vec![0.0; n];

    a[0] = 0.0;
    b[0] = 2.0;
    r[0] = x[0] + 2.0 * x[1];
    for i in 1..n.saturating_sub(1) {
        a[i] = 1.0;
        b[i] = 4.0;
        r[i] = 4.0 * x[i] + 2.0 * x[i + 1];
    }
    a[n - 1] = 2.0;
    b[n - 1] = 7.0;
    r[n - 1] = 8.0 * x[n - 1] + x[n];

    // Forward elimination
    for i in 1..n {
        let m = a[i] / b[i - 1];
        b[i] -= m;
        r[i] -= m * r[i - 1];
    }

    // Back substitution; `a` now holds the first control points
    a[n - 1] = r[n - 1] / b[n - 1];
    for i in (0..n - 1).rev() {
        a[i] = (r[i] - a[i + 1]) / b[i];
    }

    // Second control points
    b[n - 1] = (x[n] + a[n - 1]) / 2.0;
    for i in 0..n - 1 {
        b[i] = 2.0 * x[i + 1] - a[i + 1];
    }

    (a, b)
}

/// Start point and segments of a natural curve through `points`.
///
/// One point yields a start with no segments; two points yield a straight segment.
pub fn natural_curve(points: &[(f64, f64)]) -> Option<((f64, f64), Vec<CubicSegment>)> {
    let (&start, rest) = points.split_first()?;

    if rest.is_empty() {
        return Some((start, Vec::new()));
    }

    if points.len() == 2 {
        let to = points[1];
        let third = |t: f64| (start.0 + (to.0 - start.0) * t, start.1 + (to.1 - start.1) * t);
        return Some((start, vec![CubicSegment { c1: third(1.0 / 3.0), c2: third(2.0 / 3.0), to }]));
    }

    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    let (px1, px2) = control_points(&xs);
    let (py1, py2) = control_points(&ys);

    let segments = (0..points.len() - 1)
        .map(|i| CubicSegment {
            c1: (px1[i], py1[i]),
            c2: (px2[i], py2[i]),
            to: points[i + 1],
        })
        .collect();

    Some((start, segments))
}

/// Point on a cubic Bézier at parameter `t` in [0, 1]
pub fn bezier_point(from: (f64, f64), seg: &CubicSegment, t: f64) -> (f64, f64) {
    let u = 1.0 - t;
    let w0 = u * u * u;
    let w1 = 3.0 * u * u * t;
    let w2 = 3.0 * u * t * t;
    let w3 = t * t * t;
    (
        w0 * from.0 + w1 * seg.c1.0 + w2 * seg.c2.0 + w3 * seg.to.0,
        w0 * from.1 + w1 * seg.c1.1 + w2 * seg.c2.1 + w3 * seg.to.1,
    )
}

/// Approximate a path by a polyline with `steps` samples per segment
pub fn flatten(start: (f64, f64), segments: &[CubicSegment], steps: usize) -> Vec<(f64, f64)> {
    let steps = steps.max(1);
    let mut points = Vec::with_capacity(segments.len() * steps + 1);
    points.push(start);
    let mut from = start;
    for seg in segments {
        for k in 1..=steps {
            points.push(bezier_point(from, seg, k as f64 / steps as f64));
        }
        from = seg.to;
    }
    points
}

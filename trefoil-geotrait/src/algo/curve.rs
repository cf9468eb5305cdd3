use crate::*;
use trefoil_base::cgmath64::*;
use trefoil_base::tolerance::*;

/// Division count of the uniform sampling that seeds the Newton iteration.
pub const PRESEARCH_DIVISION: usize = 128;

/// Samples the curve uniformly over `range` and returns the parameter of the
/// sample closest to `point`.
pub fn presearch<C>(curve: &C, point: C::Point, range: (f64, f64), division: usize) -> f64
where
    C: ParametricCurve,
    C::Point: MetricSpace<Metric = f64> + Copy,
{
    let (t0, t1) = range;
    let mut res = t0;
    let mut min = f64::INFINITY;
    for i in 0..=division {
        let p = i as f64 / division as f64;
        let t = t0 * (1.0 - p) + t1 * p;
        let dist = curve.subs(t).distance2(point);
        if dist < min {
            min = dist;
            res = t;
        }
    }
    res
}

/// Searches the parameter of the position closest to `point` by damped Newton
/// iteration on the orthogonality condition `C'(t) . (C(t) - point) = 0`.
///
/// Every iterate is clamped to the parameter range, and each step is capped by
/// the presearch sampling interval so a distant seed cannot overshoot.
pub fn search_nearest_parameter<C>(
    curve: &C,
    point: C::Point,
    hint: f64,
    trials: usize,
) -> Option<f64>
where
    C: ParametricCurve,
    C::Point: EuclideanSpace<Scalar = f64, Diff = C::Vector>,
    C::Vector: InnerSpace<Scalar = f64>,
{
    let (t0, t1) = curve
        .try_range_tuple()
        .unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
    let step_cap = if t0.is_finite() && t1.is_finite() {
        (t1 - t0) / PRESEARCH_DIVISION as f64
    } else {
        f64::INFINITY
    };
    let mut t = hint.clamp(t0, t1);
    for _ in 0..trials {
        let diff = curve.subs(t) - point;
        let der = curve.der(t);
        let f = der.dot(diff);
        if diff.magnitude2().so_small2() || f.so_small2() {
            return Some(t);
        }
        let fprime = curve.der2(t).dot(diff) + der.magnitude2();
        if fprime.so_small() {
            return None;
        }
        let delta = (f / fprime).clamp(-step_cap, step_cap);
        let next = (t - delta).clamp(t0, t1);
        if next.near2(&t) {
            return Some(next);
        }
        t = next;
    }
    None
}

/// Searches a parameter at which the curve passes through `point`. Returns
/// `None` when the closest position is farther than the tolerance.
pub fn search_parameter<C>(curve: &C, point: C::Point, hint: f64, trials: usize) -> Option<f64>
where
    C: ParametricCurve,
    C::Point: EuclideanSpace<Scalar = f64, Diff = C::Vector> + Tolerance,
    C::Vector: InnerSpace<Scalar = f64>,
{
    search_nearest_parameter(curve, point, hint, trials).filter(|t| curve.subs(*t).near(&point))
}

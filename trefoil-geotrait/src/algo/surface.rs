use crate::*;
use trefoil_base::cgmath64::*;
use trefoil_base::tolerance::*;

pub use super::curve::PRESEARCH_DIVISION;

/// Samples the surface on a uniform grid and returns the parameter pair of
/// the sample closest to `point`.
pub fn presearch<S>(
    surface: &S,
    point: Point3,
    (urange, vrange): ((f64, f64), (f64, f64)),
    division: usize,
) -> (f64, f64)
where
    S: ParametricSurface<Point = Point3, Vector = Vector3>,
{
    let mut res = (urange.0, vrange.0);
    let mut min = f64::INFINITY;
    for i in 0..=division {
        for j in 0..=division {
            let p = i as f64 / division as f64;
            let q = j as f64 / division as f64;
            let u = urange.0 * (1.0 - p) + urange.1 * p;
            let v = vrange.0 * (1.0 - q) + vrange.1 * q;
            let dist = surface.subs(u, v).distance2(point);
            if dist < min {
                min = dist;
                res = (u, v);
            }
        }
    }
    res
}

/// Searches the parameter pair of the position closest to `point` by clamped
/// Newton iteration on the two orthogonality conditions
/// `S_u . (S - point) = 0` and `S_v . (S - point) = 0`.
pub fn search_nearest_parameter<S>(
    surface: &S,
    point: Point3,
    hint: (f64, f64),
    trials: usize,
) -> Option<(f64, f64)>
where
    S: ParametricSurface<Point = Point3, Vector = Vector3> + BoundedSurface,
{
    let ((u0, u1), (v0, v1)) = surface.range_tuple();
    let mut u = hint.0.clamp(u0, u1);
    let mut v = hint.1.clamp(v0, v1);
    for _ in 0..trials {
        let diff = surface.subs(u, v) - point;
        let uder = surface.uder(u, v);
        let vder = surface.vder(u, v);
        let f = Vector2::new(uder.dot(diff), vder.dot(diff));
        if diff.magnitude2().so_small2() || f.so_small2() {
            return Some((u, v));
        }
        let uuder = surface.uuder(u, v);
        let uvder = surface.uvder(u, v);
        let vvder = surface.vvder(u, v);
        let jacobian = Matrix2::new(
            uuder.dot(diff) + uder.magnitude2(),
            uvder.dot(diff) + uder.dot(vder),
            uvder.dot(diff) + uder.dot(vder),
            vvder.dot(diff) + vder.magnitude2(),
        );
        let inv = jacobian.invert()?;
        let delta = inv * f;
        let next_u = (u - delta.x).clamp(u0, u1);
        let next_v = (v - delta.y).clamp(v0, v1);
        if Vector2::new(next_u, next_v).near2(&Vector2::new(u, v)) {
            return Some((next_u, next_v));
        }
        u = next_u;
        v = next_v;
    }
    None
}

/// Searches a parameter pair at which the surface passes through `point`.
pub fn search_parameter<S>(
    surface: &S,
    point: Point3,
    hint: (f64, f64),
    trials: usize,
) -> Option<(f64, f64)>
where
    S: ParametricSurface<Point = Point3, Vector = Vector3> + BoundedSurface,
{
    search_nearest_parameter(surface, point, hint, trials)
        .filter(|(u, v)| surface.subs(*u, *v).near(&point))
}

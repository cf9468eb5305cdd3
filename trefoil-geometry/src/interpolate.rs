//! Global through-point interpolation and knuckle subdivision.

use crate::errors::Error;
use crate::nurbs::{BSplineCurve, KnotVec};
use crate::Result;
use serde::{Deserialize, Serialize};
use trefoil_base::cgmath64::*;
use trefoil_base::gaussian;
use trefoil_base::tolerance::Origin;

/// An interpolation input point with optional corner and tangent constraints.
///
/// Tangent vectors are honored only when `is_corner` is true; on a smooth
/// vertex they are treated as unset. An honored tangent overrides the
/// numerically estimated end derivative on the corresponding side, keeping
/// the estimated magnitude so the parameterization stays balanced.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3,
    #[serde(default)]
    pub is_corner: bool,
    #[serde(default)]
    pub tangent_in: Option<Vector3>,
    #[serde(default)]
    pub tangent_out: Option<Vector3>,
}

impl Vertex {
    #[inline(always)]
    pub const fn new(position: Point3) -> Self {
        Vertex {
            position,
            is_corner: false,
            tangent_in: None,
            tangent_out: None,
        }
    }
    #[inline(always)]
    pub const fn corner(position: Point3) -> Self {
        Vertex {
            position,
            is_corner: true,
            tangent_in: None,
            tangent_out: None,
        }
    }
}

impl From<Point3> for Vertex {
    #[inline(always)]
    fn from(position: Point3) -> Self {
        Vertex::new(position)
    }
}

/// Assignment of parameter values to a point sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parameterization {
    /// cumulative chord length
    #[default]
    Chordal,
    /// cumulative square root of chord length
    Centripetal,
}

impl Parameterization {
    /// Monotonically increasing parameters starting at zero, one per point.
    pub fn parameters(self, points: &[Point3]) -> Vec<f64> {
        let mut res = Vec::with_capacity(points.len());
        let mut acc = 0.0;
        res.push(acc);
        for w in points.windows(2) {
            let chord = w[0].distance(w[1]);
            acc += match self {
                Parameterization::Chordal => chord,
                Parameterization::Centripetal => chord.sqrt(),
            };
            res.push(acc);
        }
        res
    }
}

/// The interpolatory knot vector: ends clamped to multiplicity `degree + 1`,
/// one interior knot per interior parameter. The associated curve carries
/// `params.len() + degree - 1` control points.
pub fn interpolation_knots(degree: usize, params: &[f64]) -> KnotVec {
    let n = params.len();
    let mut knots = vec![params[0]; degree + 1];
    knots.extend_from_slice(&params[1..n - 1]);
    knots.extend(std::iter::repeat_n(params[n - 1], degree + 1));
    KnotVec::from(knots)
}

/// The averaged "de Boor" knot vector: interior knots are sliding-window
/// means of the parameters, so the control point count matches the sample
/// count exactly. Used where refitting must stay square, e.g. lofting.
pub fn averaged_knots(degree: usize, params: &[f64]) -> KnotVec {
    let n = params.len();
    let mut knots = vec![params[0]; degree + 1];
    for j in 1..n - degree {
        let window = &params[j..j + degree];
        knots.push(window.iter().sum::<f64>() / degree as f64);
    }
    knots.extend(std::iter::repeat_n(params[n - 1], degree + 1));
    KnotVec::from(knots)
}

fn check_increasing(params: &[f64]) -> Result<()> {
    match params.windows(2).any(|w| (w[1] - w[0]).so_small()) {
        true => Err(Error::SingularSystem),
        false => Ok(()),
    }
}

/// Three-point blended end derivatives; the two-point secant for pairs.
fn estimate_end_ders(points: &[Point3], params: &[f64]) -> (Vector3, Vector3) {
    let n = points.len();
    if n == 2 {
        let secant = (points[1] - points[0]) / (params[1] - params[0]);
        return (secant, secant);
    }
    let secant = |i: usize, j: usize| (points[j] - points[i]) / (params[j] - params[i]);
    let d01 = secant(0, 1);
    let d12 = secant(1, 2);
    let a = (params[1] - params[0]) / (params[2] - params[0]);
    let front = d01 * 2.0 - (d01 * (1.0 - a) + d12 * a);
    let dpq = secant(n - 3, n - 2);
    let dqr = secant(n - 2, n - 1);
    let b = (params[n - 2] - params[n - 3]) / (params[n - 1] - params[n - 3]);
    let back = dqr * 2.0 - (dpq * (1.0 - b) + dqr * b);
    (front, back)
}

fn resolve_der(explicit: Option<Vector3>, estimated: Vector3) -> Vector3 {
    match explicit {
        Some(dir) if !dir.magnitude2().so_small2() => {
            let len = estimated.magnitude();
            match len.so_small() {
                true => dir,
                false => dir.normalize() * len,
            }
        }
        _ => estimated,
    }
}

/// Fits one smooth run through `points` at `params` with the given end
/// derivatives. Point rows plus, depending on the degree, two-point
/// boundary derivative rows make the system square.
fn fit_run(
    points: &[Point3],
    params: &[f64],
    degree: usize,
    der0: Vector3,
    der1: Vector3,
) -> Result<BSplineCurve<Point3>> {
    let knots = interpolation_knots(degree, params);
    let n_cp = knots.len() - degree - 1;

    let mut matrix = Vec::with_capacity(n_cp);
    let mut rhs = Vec::with_capacity(n_cp);
    for (&t, pt) in params.iter().zip(points) {
        matrix.push(knots.bspline_basis_functions(degree, 0, t));
        rhs.push(pt.to_vec());
    }
    if degree >= 2 {
        let mut row = vec![0.0; n_cp];
        row[0] = -1.0;
        row[1] = 1.0;
        matrix.push(row);
        rhs.push(der0 * ((knots[degree + 1] - knots[0]) / degree as f64));
    }
    if degree >= 3 {
        let mut row = vec![0.0; n_cp];
        row[n_cp - 2] = -1.0;
        row[n_cp - 1] = 1.0;
        matrix.push(row);
        let len = knots.len();
        rhs.push(der1 * ((knots[len - 1] - knots[len - degree - 2]) / degree as f64));
    }

    let solution = gaussian::solve(matrix, rhs).ok_or(Error::SingularSystem)?;
    let control_points = solution.into_iter().map(Point3::from_vec).collect();
    Ok(BSplineCurve::new_unchecked(knots, control_points))
}

/// Interpolates a vertex sequence by a clamped B-spline.
///
/// The sequence is partitioned at every interior corner vertex; each run is
/// fitted independently and the results are merged with knot offsets, the
/// joint knot carrying multiplicity `degree` so a corner stays an exact
/// position-continuous kink on a single valid curve. The effective degree
/// of a run is `min(max_degree, run point count - 1)`; `max_degree` is
/// capped at 3, the highest degree the two boundary derivative rows of
/// [`fit_run`] keep square.
pub fn interpolate(
    vertices: &[Vertex],
    max_degree: usize,
    method: Parameterization,
) -> Result<BSplineCurve<Point3>> {
    if vertices.len() < 2 {
        return Err(Error::InsufficientPoints(vertices.len()));
    }
    let max_degree = max_degree.clamp(1, 3);

    let mut breaks = vec![0];
    breaks.extend(
        (1..vertices.len() - 1).filter(|&i| vertices[i].is_corner),
    );
    breaks.push(vertices.len() - 1);

    let mut curves = Vec::with_capacity(breaks.len() - 1);
    for w in breaks.windows(2) {
        let run = &vertices[w[0]..=w[1]];
        let points: Vec<Point3> = run.iter().map(|v| v.position).collect();
        let params = method.parameters(&points);
        check_increasing(&params)?;
        let degree = max_degree.min(points.len() - 1);
        let (est0, est1) = estimate_end_ders(&points, &params);
        let der0 = match run[0].is_corner {
            true => resolve_der(run[0].tangent_out, est0),
            false => est0,
        };
        let der1 = match run[run.len() - 1].is_corner {
            true => resolve_der(run[run.len() - 1].tangent_in, est1),
            false => est1,
        };
        curves.push(fit_run(&points, &params, degree, der0, der1)?);
    }

    let target = curves.iter().map(|c| c.degree()).max().unwrap_or(1);
    let mut merged: Option<BSplineCurve<Point3>> = None;
    for mut curve in curves {
        while curve.degree() < target {
            curve.elevate_degree();
        }
        merged = Some(match merged {
            None => curve,
            Some(acc) => {
                // each run is parameterized from zero, so translating by the
                // accumulated end knot lines the joint knots up exactly
                let offset = acc.knot(acc.knot_vec().len() - 1);
                curve.knot_translate(offset);
                let mut knots = acc.knot_vec().to_vec();
                knots.pop();
                knots.extend_from_slice(&curve.knot_vec()[target + 1..]);
                let mut control_points = acc.control_points().to_vec();
                control_points.extend_from_slice(&curve.control_points()[1..]);
                BSplineCurve::new_unchecked(KnotVec::from(knots), control_points)
            }
        });
    }
    merged.ok_or(Error::InsufficientPoints(vertices.len()))
}

/// Square interpolation without tangent rows: one control point per sample,
/// averaged knots. The workhorse behind lofted and networked surfaces.
pub fn interpolate_simple<P: control_point::ControlPoint<f64>>(
    points: &[P],
    params: &[f64],
    degree: usize,
) -> Result<BSplineCurve<P>> {
    let n = points.len();
    if n < 2 {
        return Err(Error::InsufficientPoints(n));
    }
    if params.len() != n {
        return Err(Error::DifferentLength);
    }
    check_increasing(params)?;
    let degree = degree.clamp(1, n - 1);
    let knots = averaged_knots(degree, params);

    let matrix = params
        .iter()
        .map(|&t| knots.bspline_basis_functions(degree, 0, t))
        .collect();
    let rhs = points.iter().map(|pt| pt.to_vec()).collect();
    let solution = gaussian::solve(matrix, rhs).ok_or(Error::SingularSystem)?;
    let control_points = solution.into_iter().map(P::from_vec).collect();
    Ok(BSplineCurve::new_unchecked(knots, control_points))
}

use crate::errors::Error;
use crate::Result;
use serde::{Deserialize, Serialize};
use trefoil_base::cgmath64::control_point::ControlPoint;
use trefoil_base::tolerance::TOLERANCE;

/// A non-decreasing sequence of knots.
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub struct KnotVec(Vec<f64>);

/// A B-spline curve of arbitrary degree over a generic control point type.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BSplineCurve<P> {
    knot_vec: KnotVec,
    control_points: Vec<P>,
}

/// A tensor-product B-spline surface.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BSplineSurface<P> {
    knot_vecs: (KnotVec, KnotVec),
    control_points: Vec<Vec<P>>,
}

/// A NURBS curve, a B-spline curve in homogeneous coordinates.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct NurbsCurve<V>(BSplineCurve<V>);

/// A NURBS surface, a B-spline surface in homogeneous coordinates.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct NurbsSurface<V>(BSplineSurface<V>);

mod bspcurve;
mod bspsurface;
mod knot_vec;
mod nurbscurve;
mod nurbssurface;

#[doc(hidden)]
#[inline(always)]
pub const fn inv_or_zero(delta: f64) -> f64 {
    if delta.abs() <= TOLERANCE {
        0.0
    } else {
        1.0 / delta
    }
}

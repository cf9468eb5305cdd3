//! The closed set of curve kinds handled by the kernel.

use crate::intersect::IntersectCurve;
use crate::nurbs::{BSplineCurve, KnotVec, NurbsCurve};
use crate::Result;
use serde::{Deserialize, Serialize};
use trefoil_base::bounding_box::BoundingBox;
use trefoil_base::cgmath64::*;
use trefoil_geotrait::{
    BoundedCurve, Cut, Invertible, ParameterRange, ParametricCurve, SPHint1D,
    SearchNearestParameter, SearchParameter, Transformed, D1,
};

/// A tagged union over the curve representations of the kernel.
///
/// Polynomial curves, including interpolated composites, live in the
/// `BSpline` variant; arcs, circles and other weighted curves in `Nurbs`.
/// Every evaluation and query capability is dispatched over the tag, so
/// callers handle one type regardless of representation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Curve {
    BSpline(BSplineCurve<Point3>),
    Nurbs(NurbsCurve<Vector4>),
}

macro_rules! dispatch {
    ($self:expr, $curve:pat => $expr:expr) => {
        match $self {
            Curve::BSpline($curve) => $expr,
            Curve::Nurbs($curve) => $expr,
        }
    };
}

impl Curve {
    pub fn degree(&self) -> usize {
        dispatch!(self, c => c.degree())
    }

    pub fn knot_vec(&self) -> &KnotVec {
        dispatch!(self, c => c.knot_vec())
    }

    pub fn is_rational(&self) -> bool {
        matches!(self, Curve::Nurbs(_))
    }

    /// Inserts a knot; the parameterization and the shape are unchanged.
    pub fn add_knot(&mut self, t: f64) -> &mut Self {
        dispatch!(&mut *self, c => { c.add_knot(t); });
        self
    }

    /// Removes the `idx`th knot if the curve stays within `tol` of its
    /// original shape.
    pub fn try_remove_knot_within(&mut self, idx: usize, tol: f64) -> Result<&mut Self> {
        dispatch!(&mut *self, c => { c.try_remove_knot_within(idx, tol)?; });
        Ok(self)
    }

    pub fn elevate_degree(&mut self) -> &mut Self {
        dispatch!(&mut *self, c => { c.elevate_degree(); });
        self
    }

    /// Splits at an interior parameter, or returns `None` at the ends.
    pub fn try_split(&self, t: f64) -> Option<(Curve, Curve)> {
        match self {
            Curve::BSpline(c) => {
                let (front, back) = c.try_split(t)?;
                Some((Curve::BSpline(front), Curve::BSpline(back)))
            }
            Curve::Nurbs(c) => {
                let (front, back) = c.try_split(t)?;
                Some((Curve::Nurbs(front), Curve::Nurbs(back)))
            }
        }
    }
}

impl From<BSplineCurve<Point3>> for Curve {
    #[inline(always)]
    fn from(curve: BSplineCurve<Point3>) -> Self {
        Curve::BSpline(curve)
    }
}

impl From<NurbsCurve<Vector4>> for Curve {
    #[inline(always)]
    fn from(curve: NurbsCurve<Vector4>) -> Self {
        Curve::Nurbs(curve)
    }
}

impl ParametricCurve for Curve {
    type Point = Point3;
    type Vector = Vector3;
    #[inline(always)]
    fn subs(&self, t: f64) -> Point3 {
        dispatch!(self, c => ParametricCurve::subs(c, t))
    }
    #[inline(always)]
    fn der(&self, t: f64) -> Vector3 {
        dispatch!(self, c => ParametricCurve::der(c, t))
    }
    #[inline(always)]
    fn der2(&self, t: f64) -> Vector3 {
        dispatch!(self, c => ParametricCurve::der2(c, t))
    }
    #[inline(always)]
    fn der_n(&self, n: usize, t: f64) -> Vector3 {
        dispatch!(self, c => ParametricCurve::der_n(c, n, t))
    }
    #[inline(always)]
    fn ders(&self, n: usize, t: f64) -> Vec<Vector3> {
        dispatch!(self, c => ParametricCurve::ders(c, n, t))
    }
    #[inline(always)]
    fn parameter_range(&self) -> ParameterRange {
        dispatch!(self, c => c.parameter_range())
    }
}

impl BoundedCurve for Curve {}

impl Cut for Curve {
    fn cut(&mut self, t: f64) -> Self {
        match self {
            Curve::BSpline(c) => Curve::BSpline(c.cut(t)),
            Curve::Nurbs(c) => Curve::Nurbs(c.cut(t)),
        }
    }
}

impl Invertible for Curve {
    #[inline(always)]
    fn invert(&mut self) {
        dispatch!(self, c => c.invert());
    }
}

impl Transformed<Matrix4> for Curve {
    fn transform_by(&mut self, trans: Matrix4) {
        match self {
            Curve::BSpline(c) => c.transform_by(trans),
            Curve::Nurbs(c) => c.transform_by(trans),
        }
    }
}

impl SearchNearestParameter<D1> for Curve {
    type Point = Point3;
    #[inline(always)]
    fn search_nearest_parameter<H: Into<SPHint1D>>(
        &self,
        point: Point3,
        hint: H,
        trials: usize,
    ) -> Option<f64> {
        dispatch!(self, c => c.search_nearest_parameter(point, hint, trials))
    }
}

impl SearchParameter<D1> for Curve {
    type Point = Point3;
    #[inline(always)]
    fn search_parameter<H: Into<SPHint1D>>(
        &self,
        point: Point3,
        hint: H,
        trials: usize,
    ) -> Option<f64> {
        dispatch!(self, c => c.search_parameter(point, hint, trials))
    }
}

impl IntersectCurve for Curve {
    #[inline(always)]
    fn polygon_bounding_box(&self) -> BoundingBox<Point3> {
        dispatch!(self, c => c.roughly_bounding_box())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conic::circle;
    use trefoil_base::assert_near;

    #[test]
    fn dispatch_agrees_with_the_underlying_curve() {
        let bsp = BSplineCurve::new(
            KnotVec::bezier_knot(2),
            vec![
                Point3::origin(),
                Point3::new(1.0, 2.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
        );
        let curve = Curve::from(bsp.clone());
        assert_eq!(curve.degree(), 2);
        assert!(!curve.is_rational());
        for i in 0..=8 {
            let t = i as f64 / 8.0;
            assert_near!(ParametricCurve::subs(&curve, t), bsp.subs(t));
            assert_near!(ParametricCurve::der(&curve, t), bsp.der(t));
        }
    }

    #[test]
    fn split_produces_matching_halves() {
        let curve = Curve::from(circle(Point3::origin(), Vector3::unit_z(), 1.0));
        assert!(curve.is_rational());
        let (front, back) = curve.try_split(0.3).unwrap();
        assert_near!(front.back(), back.front());
        assert_near!(front.back(), ParametricCurve::subs(&curve, 0.3));
        assert!(curve.try_split(0.0).is_none());
    }
}

use super::*;
use std::fmt::Debug;
use std::ops::Bound;
use trefoil_base::bounding_box::{Bounded, BoundingBox};
use trefoil_base::cgmath64::{rat_der, rat_ders, EuclideanSpace, Homogeneous, InnerSpace, MetricSpace, Zero};
use trefoil_base::tolerance::Tolerance;
use trefoil_geotrait::algo;
use trefoil_geotrait::algo::curve::PRESEARCH_DIVISION;
use trefoil_geotrait::{
    BoundedCurve, Concat, ConcatError, Cut, Invertible, ParameterRange, ParameterTransform,
    ParametricCurve, SPHint1D, SearchNearestParameter, SearchParameter, Transformed, D1,
};

impl<V> NurbsCurve<V> {
    #[inline(always)]
    pub const fn new(curve: BSplineCurve<V>) -> Self {
        NurbsCurve(curve)
    }

    /// The underlying homogeneous B-spline curve.
    #[inline(always)]
    pub const fn non_rationalized(&self) -> &BSplineCurve<V> {
        &self.0
    }

    #[inline(always)]
    pub fn into_non_rationalized(self) -> BSplineCurve<V> {
        self.0
    }

    #[inline(always)]
    pub const fn knot_vec(&self) -> &KnotVec {
        &self.0.knot_vec
    }

    #[inline(always)]
    pub fn knot(&self, idx: usize) -> f64 {
        self.0.knot_vec[idx]
    }

    #[inline(always)]
    pub const fn control_points(&self) -> &Vec<V> {
        &self.0.control_points
    }

    #[inline(always)]
    pub fn control_point(&self, idx: usize) -> &V {
        &self.0.control_points[idx]
    }

    #[inline(always)]
    pub fn control_point_mut(&mut self, idx: usize) -> &mut V {
        &mut self.0.control_points[idx]
    }

    #[inline(always)]
    pub fn transform_control_points<F: FnMut(&mut V)>(&mut self, f: F) {
        self.0.transform_control_points(f)
    }

    #[inline(always)]
    pub fn degree(&self) -> usize {
        self.0.degree()
    }

    #[inline(always)]
    pub fn is_clamped(&self) -> bool {
        self.0.knot_vec.is_clamped(self.0.degree())
    }

    #[inline(always)]
    pub fn knot_normalize(&mut self) -> &mut Self {
        self.0.knot_vec.try_normalize().unwrap();
        self
    }

    #[inline(always)]
    pub fn knot_translate(&mut self, x: f64) -> &mut Self {
        self.0.knot_vec.translate(x);
        self
    }
}

impl<V: Homogeneous<Scalar = f64>> NurbsCurve<V> {
    /// Combines a Cartesian B-spline curve with a weight per control point.
    #[inline(always)]
    pub fn try_from_bspline_and_weights(
        curve: BSplineCurve<V::Point>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        let (knot_vec, control_points) = curve.destruct();
        if control_points.len() != weights.len() {
            return Err(Error::DifferentLength);
        }
        let control_points = control_points
            .into_iter()
            .zip(weights)
            .map(|(pt, w)| V::from_point_weight(pt, w))
            .collect();
        Ok(Self(BSplineCurve::new_unchecked(knot_vec, control_points)))
    }

    /// The weight of each control point.
    #[inline(always)]
    pub fn weights(&self) -> Vec<f64> {
        self.0.control_points.iter().map(|pt| pt.weight()).collect()
    }

    /// The control points projected back to Cartesian space.
    #[inline(always)]
    pub fn rationalized_control_points(&self) -> Vec<V::Point> {
        self.0.control_points.iter().map(|pt| pt.to_point()).collect()
    }
}

impl<V: Homogeneous<Scalar = f64> + ControlPoint<f64, Diff = V> + Tolerance> NurbsCurve<V>
where
    V::Point: Tolerance,
{
    /// Returns `true` when the projected curve is constant within tolerance.
    pub fn is_const(&self) -> bool {
        let pt = self.0.control_points[0].to_point();
        self.0
            .control_points
            .iter()
            .all(move |vec| vec.to_point().near(&pt))
    }

    #[inline(always)]
    pub fn near_as_curve(&self, other: &Self) -> bool {
        self.0
            .sub_near_as_curve(&other.0, 2, move |x, y| x.to_point().near(&y.to_point()))
    }

    #[inline(always)]
    pub fn near2_as_curve(&self, other: &Self) -> bool {
        self.0
            .sub_near_as_curve(&other.0, 2, move |x, y| x.to_point().near2(&y.to_point()))
    }
}

impl<V: Homogeneous<Scalar = f64> + ControlPoint<f64, Diff = V> + Tolerance> NurbsCurve<V> {
    pub fn add_knot(&mut self, x: f64) -> &mut Self {
        self.0.add_knot(x);
        self
    }

    pub fn remove_knot(&mut self, idx: usize) -> &mut Self {
        let _ = self.try_remove_knot(idx);
        self
    }

    pub fn try_remove_knot(&mut self, idx: usize) -> Result<&mut Self> {
        self.0.try_remove_knot(idx)?;
        Ok(self)
    }

    pub fn try_remove_knot_within(&mut self, idx: usize, tol: f64) -> Result<&mut Self> {
        self.0.try_remove_knot_within(idx, tol)?;
        Ok(self)
    }

    pub fn elevate_degree(&mut self) -> &mut Self {
        self.0.elevate_degree();
        self
    }

    #[inline(always)]
    pub fn clamp(&mut self) -> &mut Self {
        self.0.clamp();
        self
    }

    pub fn optimize(&mut self) -> &mut Self {
        self.0.optimize();
        self
    }

    pub fn syncro_degree(&mut self, other: &mut Self) {
        let (degree0, degree1) = (self.degree(), other.degree());
        for _ in degree0..degree1 {
            self.elevate_degree();
        }
        for _ in degree1..degree0 {
            other.elevate_degree();
        }
    }

    pub fn syncro_knots(&mut self, other: &mut Self) {
        self.0.syncro_knots(&mut other.0)
    }

    pub fn try_split(&self, t: f64) -> Option<(Self, Self)> {
        self.0
            .try_split(t)
            .map(|(front, back)| (NurbsCurve(front), NurbsCurve(back)))
    }
}

impl<V: Homogeneous<Scalar = f64> + ControlPoint<f64, Diff = V> + Tolerance> ParameterTransform
    for NurbsCurve<V>
{
    #[inline(always)]
    fn parameter_transform(&mut self, scalar: f64, r#move: f64) -> &mut Self {
        self.0.parameter_transform(scalar, r#move);
        self
    }
}

impl<V: Homogeneous<Scalar = f64> + ControlPoint<f64, Diff = V> + Tolerance> Cut for NurbsCurve<V> {
    #[inline(always)]
    fn cut(&mut self, t: f64) -> Self {
        NurbsCurve(self.0.cut(t))
    }
}

impl<V: Homogeneous<Scalar = f64> + ControlPoint<f64, Diff = V> + Tolerance> Concat<NurbsCurve<V>>
    for NurbsCurve<V>
where
    <V as Homogeneous>::Point: Debug,
{
    type Output = NurbsCurve<V>;
    /// Concatenates after rescaling the weights of `other` so the joint
    /// control points agree in homogeneous coordinates.
    fn try_concat(
        &self,
        other: &Self,
    ) -> std::result::Result<Self, ConcatError<<V as Homogeneous>::Point>> {
        let curve0 = self.clone();
        let mut curve1 = other.clone();
        let w0 = curve0.0.control_points.last().unwrap().weight();
        let w1 = curve1.0.control_points[0].weight();
        curve1.transform_control_points(|pt| *pt *= w0 / w1);
        match curve0.0.try_concat(&curve1.0) {
            Ok(curve) => Ok(NurbsCurve::new(curve)),
            Err(err) => Err(err.point_map(|v| v.to_point())),
        }
    }
}

impl<V: Homogeneous<Scalar = f64>> NurbsCurve<V>
where
    V::Point: Bounded<Scalar = f64>,
{
    /// The bounding box of the projected control polygon.
    #[inline(always)]
    pub fn roughly_bounding_box(&self) -> BoundingBox<V::Point> {
        self.0.control_points.iter().map(|p| p.to_point()).collect()
    }
}

impl<V: Homogeneous<Scalar = f64> + ControlPoint<f64, Diff = V>> ParametricCurve for NurbsCurve<V> {
    type Point = V::Point;
    type Vector = <V::Point as EuclideanSpace>::Diff;
    #[inline(always)]
    fn subs(&self, t: f64) -> Self::Point {
        self.0.subs(t).to_point()
    }
    #[inline(always)]
    fn der(&self, t: f64) -> Self::Vector {
        rat_der(&[self.0.subs(t).to_vec(), self.0.der(t)])
    }
    #[inline(always)]
    fn der2(&self, t: f64) -> Self::Vector {
        rat_der(&[self.0.subs(t).to_vec(), self.0.der(t), self.0.der2(t)])
    }
    fn der_n(&self, n: usize, t: f64) -> Self::Vector {
        rat_der(&ParametricCurve::ders(&self.0, n, t))
    }
    fn ders(&self, n: usize, t: f64) -> Vec<Self::Vector> {
        let homogeneous = ParametricCurve::ders(&self.0, n, t);
        let mut evals = vec![Self::Vector::zero(); n + 1];
        rat_ders(&homogeneous, &mut evals);
        evals
    }
    #[inline(always)]
    fn parameter_range(&self) -> ParameterRange {
        (
            Bound::Included(self.0.knot_vec[0]),
            Bound::Included(self.0.knot_vec[self.0.knot_vec.len() - 1]),
        )
    }
}

impl<V: Homogeneous<Scalar = f64> + ControlPoint<f64, Diff = V>> BoundedCurve for NurbsCurve<V> {}

impl<V: Homogeneous<Scalar = f64> + ControlPoint<f64, Diff = V>> SearchNearestParameter<D1>
    for NurbsCurve<V>
where
    V::Point: MetricSpace<Metric = f64>,
    <V::Point as EuclideanSpace>::Diff: InnerSpace<Scalar = f64>,
{
    type Point = V::Point;
    #[inline(always)]
    fn search_nearest_parameter<H: Into<SPHint1D>>(
        &self,
        point: V::Point,
        hint: H,
        trials: usize,
    ) -> Option<f64> {
        let hint = match hint.into() {
            SPHint1D::Parameter(hint) => hint,
            SPHint1D::Range(x, y) => algo::curve::presearch(self, point, (x, y), PRESEARCH_DIVISION),
            SPHint1D::None => {
                algo::curve::presearch(self, point, self.range_tuple(), PRESEARCH_DIVISION)
            }
        };
        algo::curve::search_nearest_parameter(self, point, hint, trials)
    }
}

impl<V: Homogeneous<Scalar = f64> + ControlPoint<f64, Diff = V>> SearchParameter<D1>
    for NurbsCurve<V>
where
    V::Point: MetricSpace<Metric = f64> + Tolerance,
    <V::Point as EuclideanSpace>::Diff: InnerSpace<Scalar = f64>,
{
    type Point = V::Point;
    #[inline(always)]
    fn search_parameter<H: Into<SPHint1D>>(
        &self,
        point: V::Point,
        hint: H,
        trials: usize,
    ) -> Option<f64> {
        let hint = match hint.into() {
            SPHint1D::Parameter(hint) => hint,
            SPHint1D::Range(x, y) => algo::curve::presearch(self, point, (x, y), PRESEARCH_DIVISION),
            SPHint1D::None => {
                algo::curve::presearch(self, point, self.range_tuple(), PRESEARCH_DIVISION)
            }
        };
        algo::curve::search_parameter(self, point, hint, trials)
    }
}

impl<V: Clone> Invertible for NurbsCurve<V> {
    #[inline(always)]
    fn invert(&mut self) {
        self.0.invert();
    }
}

impl<M, V: Copy> Transformed<M> for NurbsCurve<V>
where
    M: Copy + std::ops::Mul<V, Output = V>,
{
    #[inline(always)]
    fn transform_by(&mut self, trans: M) {
        self.0
            .control_points
            .iter_mut()
            .for_each(move |v| *v = trans * *v)
    }
}

impl<V: Homogeneous<Scalar = f64>> From<BSplineCurve<V::Point>> for NurbsCurve<V> {
    #[inline(always)]
    fn from(bspcurve: BSplineCurve<V::Point>) -> NurbsCurve<V> {
        let (knot_vec, control_points) = bspcurve.destruct();
        NurbsCurve::new(BSplineCurve::new_unchecked(
            knot_vec,
            control_points.into_iter().map(V::from_point).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trefoil_base::assert_near;
    use trefoil_base::cgmath64::{Point3, Vector4};

    fn example_curve() -> NurbsCurve<Vector4> {
        let knot_vec = KnotVec::uniform_knot(2, 2);
        let control_points = vec![
            Vector4::new(0.0, 0.0, 0.0, 1.0),
            Vector4::new(2.0, 2.0, 0.0, 2.0),
            Vector4::new(2.0, 0.0, 2.0, 0.5),
            Vector4::new(3.0, 0.0, 0.0, 1.0),
        ];
        NurbsCurve::new(BSplineCurve::new(knot_vec, control_points))
    }

    #[test]
    fn weights_and_points_round_trip() {
        let curve = example_curve();
        let bsp = BSplineCurve::new(
            curve.knot_vec().clone(),
            curve.rationalized_control_points(),
        );
        let rebuilt =
            NurbsCurve::<Vector4>::try_from_bspline_and_weights(bsp, curve.weights()).unwrap();
        assert!(curve.near2_as_curve(&rebuilt));
    }

    #[test]
    fn rational_derivative_matches_finite_difference() {
        let curve = example_curve();
        let t = 0.41;
        let eps = 1.0e-6;
        let fd = (curve.subs(t + eps) - curve.subs(t - eps)) / (2.0 * eps);
        assert!((curve.der(t) - fd).magnitude() < 1.0e-4);
    }

    #[test]
    fn ders_agree_with_der_n() {
        let curve = example_curve();
        let t = 0.77;
        let ders = curve.ders(3, t);
        for (n, der) in ders.iter().enumerate() {
            assert_near!(*der, curve.der_n(n, t));
        }
        assert_near!(ders[0], EuclideanSpace::to_vec(curve.subs(t)));
    }

    #[test]
    fn concat_rescales_weights() {
        let mut front = example_curve();
        let back = front.cut(0.5);
        let concatted = front.try_concat(&back).unwrap();
        assert_near!(concatted.subs(0.25), ParametricCurve::subs(&example_curve(), 0.25));
        assert_near!(concatted.subs(0.75), ParametricCurve::subs(&example_curve(), 0.75));
    }

    #[test]
    fn search_parameter_on_rational_curve() {
        let curve = example_curve();
        let point = curve.subs(0.63);
        let t = curve.search_parameter(point, SPHint1D::None, 100).unwrap();
        assert_near!(curve.subs(t), point);
    }
}

use super::*;
use std::ops::Bound;
use trefoil_base::bounding_box::{Bounded, BoundingBox};
use trefoil_base::cgmath64::{EuclideanSpace, InnerSpace, MetricSpace, Zero};
use trefoil_base::tolerance::{Origin, Tolerance, TOLERANCE};
use trefoil_geotrait::algo;
use trefoil_geotrait::algo::curve::PRESEARCH_DIVISION;
use trefoil_geotrait::{
    BoundedCurve, Concat, ConcatError, CurveCollector, Cut, Invertible, ParameterRange,
    ParameterTransform, ParametricCurve, SPHint1D, SearchNearestParameter, SearchParameter,
    Transformed, D1,
};

impl<P> BSplineCurve<P> {
    /// Constructs a B-spline curve, panicking on invalid input.
    pub fn new(knot_vec: KnotVec, control_points: Vec<P>) -> BSplineCurve<P> {
        BSplineCurve::try_new(knot_vec, control_points)
            .unwrap_or_else(|error| panic!("{}", error))
    }

    /// Constructs a B-spline curve after validating that the control points
    /// are not empty, the knot vector is long enough, and the domain is not
    /// degenerate.
    pub fn try_new(knot_vec: KnotVec, control_points: Vec<P>) -> Result<BSplineCurve<P>> {
        if control_points.is_empty() {
            Err(Error::EmptyControlPoints)
        } else if knot_vec.len() <= control_points.len() {
            Err(Error::TooShortKnotVector(
                knot_vec.len(),
                control_points.len(),
            ))
        } else if knot_vec.range_length().so_small() {
            Err(Error::ZeroRange)
        } else {
            Ok(BSplineCurve {
                knot_vec,
                control_points,
            })
        }
    }

    /// Constructs a B-spline curve without validation. The caller guarantees
    /// the invariants of [`BSplineCurve::try_new`].
    #[inline(always)]
    pub const fn new_unchecked(knot_vec: KnotVec, control_points: Vec<P>) -> BSplineCurve<P> {
        BSplineCurve {
            knot_vec,
            control_points,
        }
    }

    #[inline(always)]
    pub fn destruct(self) -> (KnotVec, Vec<P>) {
        (self.knot_vec, self.control_points)
    }

    #[inline(always)]
    pub const fn knot_vec(&self) -> &KnotVec {
        &self.knot_vec
    }

    #[inline(always)]
    pub fn knot(&self, idx: usize) -> f64 {
        self.knot_vec[idx]
    }

    #[inline(always)]
    pub const fn control_points(&self) -> &Vec<P> {
        &self.control_points
    }

    #[inline(always)]
    pub fn control_point(&self, idx: usize) -> &P {
        &self.control_points[idx]
    }

    #[inline(always)]
    pub fn control_point_mut(&mut self, idx: usize) -> &mut P {
        &mut self.control_points[idx]
    }

    #[inline(always)]
    pub fn control_points_mut(&mut self) -> impl Iterator<Item = &mut P> {
        self.control_points.iter_mut()
    }

    #[inline(always)]
    pub fn transform_control_points<F: FnMut(&mut P)>(&mut self, f: F) {
        self.control_points.iter_mut().for_each(f)
    }

    /// The degree, always `knot_vec.len() - control_points.len() - 1`.
    #[inline(always)]
    pub fn degree(&self) -> usize {
        self.knot_vec.len() - self.control_points.len() - 1
    }

    #[inline(always)]
    pub fn is_clamped(&self) -> bool {
        self.knot_vec.is_clamped(self.degree())
    }

    #[inline(always)]
    pub fn knot_normalize(&mut self) -> &mut Self {
        self.knot_vec.try_normalize().unwrap();
        self
    }

    #[inline(always)]
    pub fn knot_translate(&mut self, x: f64) -> &mut Self {
        self.knot_vec.translate(x);
        self
    }
}

impl<P: ControlPoint<f64>> BSplineCurve<P> {
    /// Substitutes the parameter. Parameters outside the domain evaluate at
    /// the nearest end.
    pub fn subs(&self, t: f64) -> P {
        let basis = self
            .knot_vec
            .bspline_basis_functions(self.degree(), 0, t);
        self.control_points
            .iter()
            .zip(basis)
            .fold(P::origin(), |sum, (pt, basis)| sum + pt.to_vec() * basis)
    }

    /// The `n`th derivative. Zero when `n` exceeds the degree.
    pub fn der_n(&self, n: usize, t: f64) -> P::Diff {
        let basis = self
            .knot_vec
            .bspline_basis_functions(self.degree(), n, t);
        self.control_points
            .iter()
            .zip(basis)
            .fold(P::Diff::zero(), |sum, (pt, basis)| sum + pt.to_vec() * basis)
    }

    #[inline(always)]
    pub fn der(&self, t: f64) -> P::Diff {
        self.der_n(1, t)
    }

    #[inline(always)]
    pub fn der2(&self, t: f64) -> P::Diff {
        self.der_n(2, t)
    }

    #[inline(always)]
    pub fn get_closure(&self) -> impl Fn(f64) -> P + '_ {
        move |t| self.subs(t)
    }

    /// Inserts a knot by Boehm's algorithm, leaving the mapping `t -> C(t)`
    /// unchanged.
    pub fn add_knot(&mut self, x: f64) -> &mut Self {
        if x < self.knot_vec[0] {
            self.knot_vec.add_knot(x);
            self.control_points.insert(0, P::origin());
            return self;
        }

        let k = self.degree();
        let n = self.control_points.len();

        let idx = self.knot_vec.add_knot(x);
        let start = idx.saturating_sub(k);
        let end = if idx > n {
            self.control_points.push(P::origin());
            n + 1
        } else {
            self.control_points
                .insert(idx - 1, self.control_points[idx - 1]);
            idx
        };
        for i in (start..end).rev() {
            let delta = self.knot_vec[i + k + 1] - self.knot_vec[i];
            let a = inv_or_zero(delta) * (self.knot_vec[idx] - self.knot_vec[i]);
            let p = match i {
                0 => P::from_vec(self.control_points[0].to_vec() * a),
                _ => self.control_points[i - 1] * (1.0 - a) + self.control_points[i].to_vec() * a,
            };
            self.control_points[i] = p;
        }
        self
    }

    /// Raises both end knots to multiplicity `degree + 1`.
    pub fn clamp(&mut self) -> &mut Self {
        let degree = self.degree();

        let s = self.knot_vec.multiplicity(0);
        for _ in s..=degree {
            self.add_knot(self.knot_vec[0]);
        }

        let n = self.knot_vec.len();
        let s = self.knot_vec.multiplicity(n - 1);
        for _ in s..=degree {
            self.add_knot(self.knot_vec[n - 1]);
        }
        self
    }
}

impl<P> BSplineCurve<P>
where
    P: ControlPoint<f64> + Tolerance,
{
    /// Removes the `idx`th knot with the default tolerance.
    /// The curve is left untouched when the removal would move it.
    #[inline(always)]
    pub fn try_remove_knot(&mut self, idx: usize) -> Result<&mut Self> {
        self.try_remove_knot_within(idx, TOLERANCE)
    }

    /// Removes the `idx`th knot if the reconstructed control points
    /// reproduce the original curve within `tol`.
    pub fn try_remove_knot_within(&mut self, idx: usize, tol: f64) -> Result<&mut Self> {
        let k = self.degree();
        let n = self.control_points.len();
        let knot_vec = &self.knot_vec;

        if idx < k + 1 || idx >= n {
            return Err(Error::CannotRemoveKnot(idx));
        }

        let mut new_points = Vec::with_capacity(k + 1);
        new_points.push(self.control_points[idx - k - 1]);
        for i in (idx - k)..idx {
            let delta = knot_vec[i + k + 1] - knot_vec[i];
            let a = inv_or_zero(delta) * (knot_vec[idx] - knot_vec[i]);
            if a.so_small() {
                break;
            }
            let p = self.control_points[i] / a
                - new_points.last().unwrap().to_vec() * ((1.0 - a) / a);
            new_points.push(p);
        }

        if !new_points
            .last()
            .unwrap()
            .abs_diff_eq(&self.control_points[idx], tol)
        {
            return Err(Error::CannotRemoveKnot(idx));
        }

        for (i, vec) in new_points.into_iter().skip(1).enumerate() {
            self.control_points[idx - k + i] = vec;
        }
        self.control_points.remove(idx - 1);
        self.knot_vec.remove(idx);
        Ok(self)
    }

    #[inline(always)]
    pub fn remove_knot(&mut self, idx: usize) -> &mut Self {
        let _ = self.try_remove_knot(idx);
        self
    }

    /// Removes every knot that can be removed without moving the curve.
    pub fn optimize(&mut self) -> &mut Self {
        loop {
            let n = self.knot_vec.len();
            let mut removed = false;
            for i in 1..=n {
                removed = removed || self.try_remove_knot(n - i).is_ok();
            }
            if !removed {
                break;
            }
        }
        self
    }

    fn elevate_degree_bezier(&mut self) -> &mut Self {
        let k = self.degree();
        let (t0, t1) = (self.knot_vec[0], self.knot_vec[self.knot_vec.len() - 1]);
        let knot_vec =
            KnotVec::from_single_multi(vec![t0, t1], vec![k + 2, k + 2]).unwrap();
        let mut control_points = Vec::with_capacity(k + 2);
        control_points.push(self.control_points[0]);
        for i in 1..=k {
            let a = i as f64 / (k + 1) as f64;
            control_points.push(
                self.control_points[i - 1] * a + self.control_points[i].to_vec() * (1.0 - a),
            );
        }
        control_points.push(self.control_points[k]);
        *self = BSplineCurve::new_unchecked(knot_vec, control_points);
        self
    }

    /// Raises the degree by one without changing the mapping `t -> C(t)`.
    pub fn elevate_degree(&mut self) -> &mut Self {
        let mut result = CurveCollector::Singleton;
        for mut bezier in self.bezier_decomposition() {
            bezier.elevate_degree_bezier();
            result.concat(&bezier);
        }
        *self = result.unwrap();
        self.optimize();
        self
    }

    /// Splits the curve into its Bezier segments.
    pub fn bezier_decomposition(&self) -> Vec<BSplineCurve<P>> {
        let mut curve = self.clone();
        curve.clamp();
        let (knots, _) = self.knot_vec.to_single_multi();

        let mut result = Vec::new();
        for knot in knots.iter().skip(1).take(knots.len() - 2) {
            let back = curve.cut(*knot);
            result.push(std::mem::replace(&mut curve, back));
        }
        result.push(curve);
        result
    }

    /// Splits at a strictly interior parameter, returning `None` when `t` is
    /// on or beyond the boundary. The curve itself is never mutated.
    pub fn try_split(&self, t: f64) -> Option<(Self, Self)> {
        let (t0, t1) = self.range_tuple();
        if t <= t0 + TOLERANCE || t >= t1 - TOLERANCE {
            return None;
        }
        let mut front = self.clone();
        let back = front.cut(t);
        Some((front, back))
    }

    /// Raises both degrees to the larger one.
    pub fn syncro_degree(&mut self, other: &mut Self) {
        let (degree0, degree1) = (self.degree(), other.degree());
        for _ in degree0..degree1 {
            self.elevate_degree();
        }
        for _ in degree1..degree0 {
            other.elevate_degree();
        }
    }

    /// Normalizes both domains to `[0, 1]` and inserts knots until both
    /// curves share the same knot vector.
    pub fn syncro_knots(&mut self, other: &mut BSplineCurve<P>) {
        self.knot_normalize();
        other.knot_normalize();

        let mut i = 0;
        let mut j = 0;
        while !self.knot(i).near2(&1.0) || !other.knot(j).near2(&1.0) {
            if self.knot(i) - other.knot(j) > TOLERANCE {
                self.add_knot(other.knot(j));
            } else if other.knot(j) - self.knot(i) > TOLERANCE {
                other.add_knot(self.knot(i));
            }
            i += 1;
            j += 1;
        }

        let n0 = self.knot_vec.len();
        let n1 = other.knot_vec.len();
        if n0 < n1 {
            (0..n1 - n0).for_each(|_| {
                self.add_knot(1.0);
            });
        } else {
            (0..n0 - n1).for_each(|_| {
                other.add_knot(1.0);
            });
        }
    }

    /// Returns `true` when the curve is constant within tolerance.
    pub fn is_const(&self) -> bool {
        self.control_points
            .iter()
            .all(|pt| pt.near(&self.control_points[0]))
    }

    pub(super) fn sub_near_as_curve<F: Fn(&P, &P) -> bool>(
        &self,
        other: &BSplineCurve<P>,
        div_coef: usize,
        ord: F,
    ) -> bool {
        if !self.knot_vec.same_range(&other.knot_vec) {
            return false;
        }

        let division = std::cmp::max(self.degree(), other.degree()) * div_coef;
        for i in 0..(self.knot_vec.len() - 1) {
            let delta = self.knot_vec[i + 1] - self.knot_vec[i];
            if delta.so_small() {
                continue;
            }

            for j in 0..division {
                let t = self.knot_vec[i] + delta * (j as f64) / (division as f64);
                if !ord(&self.subs(t), &other.subs(t)) {
                    return false;
                }
            }
        }
        true
    }

    /// Two curves are near as curves when they coincide as mappings,
    /// knot vectors included.
    #[inline(always)]
    pub fn near_as_curve(&self, other: &BSplineCurve<P>) -> bool {
        self.sub_near_as_curve(other, 2, |x, y| x.near(y))
    }

    #[inline(always)]
    pub fn near2_as_curve(&self, other: &BSplineCurve<P>) -> bool {
        self.sub_near_as_curve(other, 2, |x, y| x.near2(y))
    }
}

impl<P: Bounded<Scalar = f64> + Copy> BSplineCurve<P> {
    /// The bounding box of the control polygon, which contains the curve by
    /// the convex hull property.
    #[inline(always)]
    pub fn roughly_bounding_box(&self) -> BoundingBox<P> {
        self.control_points.iter().collect()
    }
}

impl<P: ControlPoint<f64>> ParametricCurve for BSplineCurve<P> {
    type Point = P;
    type Vector = P::Diff;
    #[inline(always)]
    fn subs(&self, t: f64) -> Self::Point {
        BSplineCurve::subs(self, t)
    }
    #[inline(always)]
    fn der(&self, t: f64) -> Self::Vector {
        BSplineCurve::der(self, t)
    }
    #[inline(always)]
    fn der2(&self, t: f64) -> Self::Vector {
        BSplineCurve::der2(self, t)
    }
    #[inline(always)]
    fn der_n(&self, n: usize, t: f64) -> Self::Vector {
        BSplineCurve::der_n(self, n, t)
    }
    #[inline(always)]
    fn parameter_range(&self) -> ParameterRange {
        (
            Bound::Included(self.knot_vec[0]),
            Bound::Included(self.knot_vec[self.knot_vec.len() - 1]),
        )
    }
}

impl<P: ControlPoint<f64>> BoundedCurve for BSplineCurve<P> {}

impl<P: ControlPoint<f64>> ParameterTransform for BSplineCurve<P> {
    #[inline(always)]
    fn parameter_transform(&mut self, scalar: f64, r#move: f64) -> &mut Self {
        self.knot_vec.transform(scalar, r#move);
        self
    }
}

impl<P: ControlPoint<f64> + Tolerance> Cut for BSplineCurve<P> {
    fn cut(&mut self, mut t: f64) -> BSplineCurve<P> {
        let degree = self.degree();

        let idx = match self.knot_vec.floor(t) {
            Some(idx) => idx + 1,
            None => {
                let bspline = self.clone();
                let knot_vec = KnotVec::from(vec![t, self.knot_vec[0]]);
                let ctrl_pts = vec![P::origin()];
                *self = BSplineCurve::new_unchecked(knot_vec, ctrl_pts);
                return bspline;
            }
        };
        let s = if t.near(&self.knot_vec[idx - 1]) {
            t = self.knot_vec[idx - 1];
            self.knot_vec.multiplicity(idx - 1)
        } else {
            0
        };

        for _ in s..=degree {
            self.add_knot(t);
        }

        let k = self.knot_vec.floor(t).unwrap();
        let m = self.knot_vec.len();
        let n = self.control_points.len();
        let knot_vec0 = self.knot_vec.sub_vec(0..=k);
        let knot_vec1 = self.knot_vec.sub_vec((k - degree)..m);
        let control_points0 = Vec::from(&self.control_points[0..(k - degree)]);
        let control_points1 = Vec::from(&self.control_points[(k - degree)..n]);
        *self = BSplineCurve::new_unchecked(knot_vec0, control_points0);
        BSplineCurve::new_unchecked(knot_vec1, control_points1)
    }
}

impl<P: ControlPoint<f64> + Tolerance> Concat<BSplineCurve<P>> for BSplineCurve<P> {
    type Output = BSplineCurve<P>;
    fn try_concat(
        &self,
        rhs: &BSplineCurve<P>,
    ) -> std::result::Result<BSplineCurve<P>, ConcatError<P>> {
        let (t0, t1) = (self.range_tuple().1, rhs.range_tuple().0);
        if !t0.near(&t1) {
            return Err(ConcatError::DisconnectedParameters(t0, t1));
        }
        let (back, front) = (self.back(), rhs.front());
        if !back.near(&front) {
            return Err(ConcatError::DisconnectedPoints(back, front));
        }
        let mut curve = self.clone();
        curve
            .knot_vec
            .try_concat(&rhs.knot_vec, self.degree())
            .unwrap_or_else(|error| panic!("{}", error));
        curve
            .control_points
            .extend(rhs.control_points.iter().copied());
        Ok(curve)
    }
}

impl<P: Clone> Invertible for BSplineCurve<P> {
    #[inline(always)]
    fn invert(&mut self) {
        self.knot_vec.invert();
        self.control_points.reverse();
    }
}

impl<M: Copy, P: ControlPoint<f64> + Transformed<M>> Transformed<M> for BSplineCurve<P> {
    #[inline(always)]
    fn transform_by(&mut self, trans: M) {
        self.control_points
            .iter_mut()
            .for_each(move |p| p.transform_by(trans))
    }
}

impl<P> SearchNearestParameter<D1> for BSplineCurve<P>
where
    P: ControlPoint<f64>
        + EuclideanSpace<Scalar = f64, Diff = <P as ControlPoint<f64>>::Diff>
        + MetricSpace<Metric = f64>,
    <P as ControlPoint<f64>>::Diff: InnerSpace<Scalar = f64>,
{
    type Point = P;
    #[inline(always)]
    fn search_nearest_parameter<H: Into<SPHint1D>>(
        &self,
        point: P,
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

impl<P> SearchParameter<D1> for BSplineCurve<P>
where
    P: ControlPoint<f64>
        + EuclideanSpace<Scalar = f64, Diff = <P as ControlPoint<f64>>::Diff>
        + MetricSpace<Metric = f64>
        + Tolerance,
    <P as ControlPoint<f64>>::Diff: InnerSpace<Scalar = f64>,
{
    type Point = P;
    #[inline(always)]
    fn search_parameter<H: Into<SPHint1D>>(
        &self,
        point: P,
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

#[cfg(test)]
mod tests {
    use super::*;
    use trefoil_base::assert_near;
    use trefoil_base::cgmath64::Point3;

    fn example_curve() -> BSplineCurve<Point3> {
        let knot_vec = KnotVec::uniform_knot(3, 3);
        let control_points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(2.0, -1.0, 1.0),
            Point3::new(3.0, 1.0, -1.0),
            Point3::new(4.0, 0.5, 0.5),
            Point3::new(5.0, 0.0, 0.0),
        ];
        BSplineCurve::new(knot_vec, control_points)
    }

    #[test]
    fn add_knot_keeps_the_mapping() {
        let curve0 = example_curve();
        let mut curve1 = curve0.clone();
        curve1.add_knot(0.3).add_knot(0.5).add_knot(0.82);
        assert_eq!(curve1.control_points().len(), curve0.control_points().len() + 3);
        assert!(curve0.near2_as_curve(&curve1));
    }

    #[test]
    fn remove_knot_inverts_add_knot() {
        let curve0 = example_curve();
        let mut curve1 = curve0.clone();
        curve1.add_knot(0.5);
        let idx = curve1.knot_vec().floor(0.5).unwrap();
        curve1.try_remove_knot(idx).unwrap();
        assert_eq!(curve1.knot_vec().len(), curve0.knot_vec().len());
        assert!(curve0.near2_as_curve(&curve1));
    }

    #[test]
    fn remove_essential_knot_is_rejected() {
        let mut curve = example_curve();
        let before = curve.clone();
        assert!(curve.try_remove_knot(4).is_err());
        assert_eq!(curve, before);
    }

    #[test]
    fn elevate_degree_keeps_the_mapping() {
        let curve0 = example_curve();
        let mut curve1 = curve0.clone();
        curve1.elevate_degree();
        assert_eq!(curve1.degree(), curve0.degree() + 1);
        assert!(curve0.near2_as_curve(&curve1));
    }

    #[test]
    fn degree_one_curve_is_polyline() {
        let knot_vec = KnotVec::bezier_knot(1);
        let curve = BSplineCurve::new(
            knot_vec,
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 0.0)],
        );
        assert_eq!(curve.degree(), 1);
        assert_near!(curve.subs(0.5), Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn split_rejects_boundary_parameters() {
        let curve = example_curve();
        assert!(curve.try_split(0.0).is_none());
        assert!(curve.try_split(1.0).is_none());
        let (front, back) = curve.try_split(0.4).unwrap();
        assert_near!(front.back(), curve.subs(0.4));
        assert_near!(back.front(), curve.subs(0.4));
    }

    #[test]
    fn cut_and_concat_random() {
        let curve = example_curve();
        trefoil_geotrait::cut_random_test(&curve, 10);
    }

    #[test]
    fn parameter_transform_random() {
        let curve = example_curve();
        trefoil_geotrait::parameter_transform_random_test(&curve, 10);
    }

    #[test]
    fn concat_two_pieces() {
        let mut front = example_curve();
        let back = front.cut(0.6);
        trefoil_geotrait::concat_random_test(&front, &back, 10);
    }

    #[test]
    fn search_nearest_parameter_finds_foot() {
        let curve = example_curve();
        let t = 0.73;
        let point = curve.subs(t);
        let found = curve
            .search_parameter(point, SPHint1D::None, 100)
            .unwrap();
        assert_near!(curve.subs(found), point);
    }
}

use super::*;
use std::ops::Bound;
use trefoil_base::cgmath64::{Point3, Zero};
use trefoil_base::tolerance::Origin;
use trefoil_geotrait::algo;
use trefoil_geotrait::algo::surface::PRESEARCH_DIVISION;
use trefoil_geotrait::{
    BoundedSurface, ParameterRange, ParametricSurface, ParametricSurface3D, SPHint2D,
    SearchNearestParameter, SearchParameter, D2,
};

impl<P> BSplineSurface<P> {
    /// Constructs a B-spline surface, panicking on invalid input.
    pub fn new(knot_vecs: (KnotVec, KnotVec), control_points: Vec<Vec<P>>) -> BSplineSurface<P> {
        BSplineSurface::try_new(knot_vecs, control_points)
            .unwrap_or_else(|error| panic!("{}", error))
    }

    /// Constructs a B-spline surface after validating the control net shape
    /// and both knot vectors.
    pub fn try_new(
        knot_vecs: (KnotVec, KnotVec),
        control_points: Vec<Vec<P>>,
    ) -> Result<BSplineSurface<P>> {
        if control_points.is_empty() || control_points[0].is_empty() {
            return Err(Error::EmptyControlPoints);
        }
        let len = control_points[0].len();
        if control_points.iter().any(|row| row.len() != len) {
            return Err(Error::IrregularControlPoints);
        }
        if knot_vecs.0.len() <= control_points.len() {
            return Err(Error::TooShortKnotVector(
                knot_vecs.0.len(),
                control_points.len(),
            ));
        }
        if knot_vecs.1.len() <= len {
            return Err(Error::TooShortKnotVector(knot_vecs.1.len(), len));
        }
        if knot_vecs.0.range_length().so_small() || knot_vecs.1.range_length().so_small() {
            return Err(Error::ZeroRange);
        }
        Ok(BSplineSurface {
            knot_vecs,
            control_points,
        })
    }

    /// Constructs a B-spline surface without validation.
    #[inline(always)]
    pub const fn new_unchecked(
        knot_vecs: (KnotVec, KnotVec),
        control_points: Vec<Vec<P>>,
    ) -> BSplineSurface<P> {
        BSplineSurface {
            knot_vecs,
            control_points,
        }
    }

    #[inline(always)]
    pub fn destruct(self) -> ((KnotVec, KnotVec), Vec<Vec<P>>) {
        (self.knot_vecs, self.control_points)
    }

    #[inline(always)]
    pub const fn knot_vecs(&self) -> &(KnotVec, KnotVec) {
        &self.knot_vecs
    }

    #[inline(always)]
    pub const fn uknot_vec(&self) -> &KnotVec {
        &self.knot_vecs.0
    }

    #[inline(always)]
    pub const fn vknot_vec(&self) -> &KnotVec {
        &self.knot_vecs.1
    }

    #[inline(always)]
    pub const fn control_points(&self) -> &Vec<Vec<P>> {
        &self.control_points
    }

    #[inline(always)]
    pub fn control_point(&self, idx0: usize, idx1: usize) -> &P {
        &self.control_points[idx0][idx1]
    }

    #[inline(always)]
    pub fn control_point_mut(&mut self, idx0: usize, idx1: usize) -> &mut P {
        &mut self.control_points[idx0][idx1]
    }

    #[inline(always)]
    pub fn transform_control_points<F: FnMut(&mut P)>(&mut self, mut f: F) {
        self.control_points
            .iter_mut()
            .for_each(|row| row.iter_mut().for_each(&mut f))
    }

    /// The degree in the `u` direction.
    #[inline(always)]
    pub fn udegree(&self) -> usize {
        self.knot_vecs.0.len() - self.control_points.len() - 1
    }

    /// The degree in the `v` direction.
    #[inline(always)]
    pub fn vdegree(&self) -> usize {
        self.knot_vecs.1.len() - self.control_points[0].len() - 1
    }

    #[inline(always)]
    pub fn degrees(&self) -> (usize, usize) {
        (self.udegree(), self.vdegree())
    }

    #[inline(always)]
    pub fn knot_normalize(&mut self) -> &mut Self {
        self.knot_vecs.0.try_normalize().unwrap();
        self.knot_vecs.1.try_normalize().unwrap();
        self
    }

    /// Transposes the control net, exchanging the roles of `u` and `v`.
    pub fn swap_axes(&mut self) -> &mut Self
    where
        P: Copy,
    {
        std::mem::swap(&mut self.knot_vecs.0, &mut self.knot_vecs.1);
        let n0 = self.control_points.len();
        let n1 = self.control_points[0].len();
        let transposed = (0..n1)
            .map(|j| (0..n0).map(|i| self.control_points[i][j]).collect())
            .collect();
        self.control_points = transposed;
        self
    }
}

impl<P: ControlPoint<f64>> BSplineSurface<P> {
    /// Extracts the `j`th column of the control net as a curve in `u`.
    pub(crate) fn column_curve(&self, j: usize) -> BSplineCurve<P> {
        BSplineCurve::new_unchecked(
            self.knot_vecs.0.clone(),
            self.control_points.iter().map(|row| row[j]).collect(),
        )
    }

    /// Extracts the `i`th row of the control net as a curve in `v`.
    pub(crate) fn row_curve(&self, i: usize) -> BSplineCurve<P> {
        BSplineCurve::new_unchecked(self.knot_vecs.1.clone(), self.control_points[i].clone())
    }

    /// Inserts a `u` knot, applying Boehm's algorithm to every column of the
    /// control net.
    pub fn add_uknot(&mut self, x: f64) -> &mut Self {
        let n1 = self.control_points[0].len();
        let mut columns: Vec<_> = (0..n1).map(|j| self.column_curve(j)).collect();
        columns.iter_mut().for_each(|curve| {
            curve.add_knot(x);
        });
        self.knot_vecs.0 = columns[0].knot_vec().clone();
        let n0 = columns[0].control_points().len();
        self.control_points = (0..n0)
            .map(|i| columns.iter().map(|curve| *curve.control_point(i)).collect())
            .collect();
        self
    }

    /// Inserts a `v` knot, applying Boehm's algorithm to every row of the
    /// control net.
    pub fn add_vknot(&mut self, x: f64) -> &mut Self {
        let rows: Vec<_> = (0..self.control_points.len())
            .map(|i| {
                let mut row = self.row_curve(i);
                row.add_knot(x);
                row
            })
            .collect();
        self.knot_vecs.1 = rows[0].knot_vec().clone();
        self.control_points = rows
            .into_iter()
            .map(|row| row.destruct().1)
            .collect();
        self
    }

    /// Substitutes the parameter pair.
    pub fn subs(&self, u: f64, v: f64) -> P {
        let ubasis = self
            .knot_vecs
            .0
            .bspline_basis_functions(self.udegree(), 0, u);
        let vbasis = self
            .knot_vecs
            .1
            .bspline_basis_functions(self.vdegree(), 0, v);
        self.control_points
            .iter()
            .zip(&ubasis)
            .fold(P::origin(), |sum, (row, ub)| {
                let row_sum = row
                    .iter()
                    .zip(&vbasis)
                    .fold(P::Diff::zero(), |s, (pt, vb)| s + pt.to_vec() * *vb);
                sum + row_sum * *ub
            })
    }

    /// The derivative of order `m` in `u` and `n` in `v`. Zero when either
    /// order exceeds the corresponding degree.
    pub fn der_mn(&self, m: usize, n: usize, u: f64, v: f64) -> P::Diff {
        let ubasis = self
            .knot_vecs
            .0
            .bspline_basis_functions(self.udegree(), m, u);
        let vbasis = self
            .knot_vecs
            .1
            .bspline_basis_functions(self.vdegree(), n, v);
        self.control_points
            .iter()
            .zip(&ubasis)
            .fold(P::Diff::zero(), |sum, (row, ub)| {
                let row_sum = row
                    .iter()
                    .zip(&vbasis)
                    .fold(P::Diff::zero(), |s, (pt, vb)| s + pt.to_vec() * *vb);
                sum + row_sum * *ub
            })
    }
}

impl<P: ControlPoint<f64>> ParametricSurface for BSplineSurface<P> {
    type Point = P;
    type Vector = P::Diff;
    #[inline(always)]
    fn subs(&self, u: f64, v: f64) -> Self::Point {
        BSplineSurface::subs(self, u, v)
    }
    #[inline(always)]
    fn der_mn(&self, m: usize, n: usize, u: f64, v: f64) -> Self::Vector {
        BSplineSurface::der_mn(self, m, n, u, v)
    }
    #[inline(always)]
    fn parameter_range(&self) -> (ParameterRange, ParameterRange) {
        let (ref uknots, ref vknots) = self.knot_vecs;
        (
            (
                Bound::Included(uknots[0]),
                Bound::Included(uknots[uknots.len() - 1]),
            ),
            (
                Bound::Included(vknots[0]),
                Bound::Included(vknots[vknots.len() - 1]),
            ),
        )
    }
}

impl<P: ControlPoint<f64>> BoundedSurface for BSplineSurface<P> {}

impl ParametricSurface3D for BSplineSurface<Point3> {}

impl SearchNearestParameter<D2> for BSplineSurface<Point3> {
    type Point = Point3;
    #[inline(always)]
    fn search_nearest_parameter<H: Into<SPHint2D>>(
        &self,
        point: Point3,
        hint: H,
        trials: usize,
    ) -> Option<(f64, f64)> {
        let hint = match hint.into() {
            SPHint2D::Parameter(x, y) => (x, y),
            SPHint2D::Range(range0, range1) => {
                algo::surface::presearch(self, point, (range0, range1), PRESEARCH_DIVISION)
            }
            SPHint2D::None => {
                algo::surface::presearch(self, point, self.range_tuple(), PRESEARCH_DIVISION)
            }
        };
        algo::surface::search_nearest_parameter(self, point, hint, trials)
    }
}

impl SearchParameter<D2> for BSplineSurface<Point3> {
    type Point = Point3;
    #[inline(always)]
    fn search_parameter<H: Into<SPHint2D>>(
        &self,
        point: Point3,
        hint: H,
        trials: usize,
    ) -> Option<(f64, f64)> {
        let hint = match hint.into() {
            SPHint2D::Parameter(x, y) => (x, y),
            SPHint2D::Range(range0, range1) => {
                algo::surface::presearch(self, point, (range0, range1), PRESEARCH_DIVISION)
            }
            SPHint2D::None => {
                algo::surface::presearch(self, point, self.range_tuple(), PRESEARCH_DIVISION)
            }
        };
        algo::surface::search_parameter(self, point, hint, trials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trefoil_base::assert_near;
    use trefoil_base::cgmath64::InnerSpace;

    fn example_surface() -> BSplineSurface<Point3> {
        let uknots = KnotVec::bezier_knot(2);
        let vknots = KnotVec::bezier_knot(1);
        let control_points = vec![
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![Point3::new(1.0, 0.0, 1.0), Point3::new(1.0, 1.0, 1.0)],
            vec![Point3::new(2.0, 0.0, 0.0), Point3::new(2.0, 1.0, 0.0)],
        ];
        BSplineSurface::new((uknots, vknots), control_points)
    }

    #[test]
    fn corners_match_control_net() {
        let surface = example_surface();
        assert_near!(surface.subs(0.0, 0.0), Point3::new(0.0, 0.0, 0.0));
        assert_near!(surface.subs(1.0, 1.0), Point3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn add_knot_keeps_the_mapping() {
        let surface0 = example_surface();
        let mut surface1 = surface0.clone();
        surface1.add_uknot(0.5).add_vknot(0.25);
        for i in 0..=8 {
            for j in 0..=8 {
                let (u, v) = (i as f64 / 8.0, j as f64 / 8.0);
                assert_near!(surface0.subs(u, v), surface1.subs(u, v));
            }
        }
    }

    #[test]
    fn swap_axes_transposes_evaluation() {
        let surface0 = example_surface();
        let mut surface1 = surface0.clone();
        surface1.swap_axes();
        assert_near!(surface0.subs(0.3, 0.7), surface1.subs(0.7, 0.3));
        assert_near!(
            surface0.normal(0.3, 0.7),
            surface1.normal(0.7, 0.3) * -1.0,
        );
    }

    #[test]
    fn search_parameter_on_surface() {
        let surface = example_surface();
        let point = surface.subs(0.4, 0.6);
        let (u, v) = surface.search_parameter(point, SPHint2D::None, 100).unwrap();
        assert_near!(surface.subs(u, v), point);
    }

    #[test]
    fn derivatives_consistent_with_finite_difference() {
        let surface = example_surface();
        let (u, v) = (0.37, 0.81);
        let eps = 1.0e-6;
        let fd_u = (surface.subs(u + eps, v) - surface.subs(u - eps, v)) / (2.0 * eps);
        let fd_v = (surface.subs(u, v + eps) - surface.subs(u, v - eps)) / (2.0 * eps);
        assert!((surface.uder(u, v) - fd_u).magnitude() < 1.0e-4);
        assert!((surface.vder(u, v) - fd_v).magnitude() < 1.0e-4);
    }
}

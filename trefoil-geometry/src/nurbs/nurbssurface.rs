use super::*;
use std::ops::Bound;
use trefoil_base::cgmath64::{EuclideanSpace, Homogeneous, Vector4};
use trefoil_base::homogeneous::multi_rat_der;
use trefoil_geotrait::algo;
use trefoil_geotrait::algo::surface::PRESEARCH_DIVISION;
use trefoil_geotrait::{
    BoundedSurface, ParameterRange, ParametricSurface, ParametricSurface3D, SPHint2D,
    SearchNearestParameter, SearchParameter, D2,
};

impl<V> NurbsSurface<V> {
    #[inline(always)]
    pub const fn new(surface: BSplineSurface<V>) -> Self {
        NurbsSurface(surface)
    }

    /// The underlying homogeneous B-spline surface.
    #[inline(always)]
    pub const fn non_rationalized(&self) -> &BSplineSurface<V> {
        &self.0
    }

    #[inline(always)]
    pub fn into_non_rationalized(self) -> BSplineSurface<V> {
        self.0
    }

    #[inline(always)]
    pub const fn knot_vecs(&self) -> &(KnotVec, KnotVec) {
        &self.0.knot_vecs
    }

    #[inline(always)]
    pub const fn control_points(&self) -> &Vec<Vec<V>> {
        &self.0.control_points
    }

    #[inline(always)]
    pub fn control_point(&self, idx0: usize, idx1: usize) -> &V {
        &self.0.control_points[idx0][idx1]
    }

    #[inline(always)]
    pub fn udegree(&self) -> usize {
        self.0.udegree()
    }

    #[inline(always)]
    pub fn vdegree(&self) -> usize {
        self.0.vdegree()
    }

    #[inline(always)]
    pub fn knot_normalize(&mut self) -> &mut Self {
        self.0.knot_normalize();
        self
    }
}

impl<V: Homogeneous<Scalar = f64>> NurbsSurface<V> {
    /// Combines a Cartesian control net with a weight per control point.
    pub fn try_from_bspline_and_weights(
        surface: BSplineSurface<V::Point>,
        weights: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let (knot_vecs, control_points) = surface.destruct();
        if control_points.len() != weights.len()
            || control_points
                .iter()
                .zip(&weights)
                .any(|(row, wrow)| row.len() != wrow.len())
        {
            return Err(Error::DifferentLength);
        }
        let control_points = control_points
            .into_iter()
            .zip(weights)
            .map(|(row, wrow)| {
                row.into_iter()
                    .zip(wrow)
                    .map(|(pt, w)| V::from_point_weight(pt, w))
                    .collect()
            })
            .collect();
        Ok(Self(BSplineSurface::new_unchecked(knot_vecs, control_points)))
    }
}

impl<V: Homogeneous<Scalar = f64> + ControlPoint<f64, Diff = V>> ParametricSurface
    for NurbsSurface<V>
{
    type Point = V::Point;
    type Vector = <V::Point as EuclideanSpace>::Diff;
    #[inline(always)]
    fn subs(&self, u: f64, v: f64) -> Self::Point {
        self.0.subs(u, v).to_point()
    }
    fn der_mn(&self, m: usize, n: usize, u: f64, v: f64) -> Self::Vector {
        let ders: Vec<Vec<V>> = (0..=m)
            .map(|i| (0..=n).map(|j| self.0.der_mn(i, j, u, v)).collect())
            .collect();
        multi_rat_der(&ders)
    }
    #[inline(always)]
    fn parameter_range(&self) -> (ParameterRange, ParameterRange) {
        let (ref uknots, ref vknots) = self.0.knot_vecs;
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

impl<V: Homogeneous<Scalar = f64> + ControlPoint<f64, Diff = V>> BoundedSurface
    for NurbsSurface<V>
{
}

impl ParametricSurface3D for NurbsSurface<Vector4> {}

impl SearchNearestParameter<D2> for NurbsSurface<Vector4> {
    type Point = <Vector4 as Homogeneous>::Point;
    #[inline(always)]
    fn search_nearest_parameter<H: Into<SPHint2D>>(
        &self,
        point: Self::Point,
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

impl SearchParameter<D2> for NurbsSurface<Vector4> {
    type Point = <Vector4 as Homogeneous>::Point;
    #[inline(always)]
    fn search_parameter<H: Into<SPHint2D>>(
        &self,
        point: Self::Point,
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
    use trefoil_base::cgmath64::{Point3, Vector3};

    // A quarter cylinder of radius one around the z axis.
    fn quarter_cylinder() -> NurbsSurface<Vector4> {
        let uknots = KnotVec::bezier_knot(2);
        let vknots = KnotVec::bezier_knot(1);
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let control_points = vec![
            vec![
                Vector4::new(1.0, 0.0, 0.0, 1.0),
                Vector4::new(1.0, 0.0, 1.0, 1.0),
            ],
            vec![
                Vector4::new(w, w, 0.0, w),
                Vector4::new(w, w, w, w),
            ],
            vec![
                Vector4::new(0.0, 1.0, 0.0, 1.0),
                Vector4::new(0.0, 1.0, 1.0, 1.0),
            ],
        ];
        NurbsSurface::new(BSplineSurface::new((uknots, vknots), control_points))
    }

    #[test]
    fn points_lie_on_the_cylinder() {
        let surface = quarter_cylinder();
        for i in 0..=8 {
            for j in 0..=4 {
                let (u, v) = (i as f64 / 8.0, j as f64 / 4.0);
                let pt = surface.subs(u, v);
                assert_near!(pt.x * pt.x + pt.y * pt.y, 1.0);
            }
        }
    }

    #[test]
    fn normal_is_radial() {
        let surface = quarter_cylinder();
        let (u, v) = (0.3, 0.6);
        let pt = surface.subs(u, v);
        let radial = Vector3::new(pt.x, pt.y, 0.0);
        let normal = surface.normal(u, v);
        assert_near!(normal.cross(radial), Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn search_nearest_parameter_projects_onto_surface() {
        let surface = quarter_cylinder();
        let (u, v) = surface
            .search_nearest_parameter(Point3::new(2.0, 2.0, 0.5), SPHint2D::None, 100)
            .unwrap();
        let foot = surface.subs(u, v);
        let w = std::f64::consts::FRAC_1_SQRT_2;
        assert_near!(foot, Point3::new(w, w, 0.5));
    }
}

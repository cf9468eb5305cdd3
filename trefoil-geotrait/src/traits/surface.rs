use super::*;

/// Tensor-product parametric surface evaluated over `(u, v)`.
pub trait ParametricSurface: Clone {
    type Point;
    type Vector: Zero + Copy;
    /// Substitutes the parameter `(u, v)` and returns the point on the surface.
    fn subs(&self, u: f64, v: f64) -> Self::Point;
    /// Returns the derivative of order `m` in `u` and `n` in `v`.
    fn der_mn(&self, m: usize, n: usize, u: f64, v: f64) -> Self::Vector;
    fn uder(&self, u: f64, v: f64) -> Self::Vector {
        self.der_mn(1, 0, u, v)
    }
    fn vder(&self, u: f64, v: f64) -> Self::Vector {
        self.der_mn(0, 1, u, v)
    }
    fn uuder(&self, u: f64, v: f64) -> Self::Vector {
        self.der_mn(2, 0, u, v)
    }
    fn uvder(&self, u: f64, v: f64) -> Self::Vector {
        self.der_mn(1, 1, u, v)
    }
    fn vvder(&self, u: f64, v: f64) -> Self::Vector {
        self.der_mn(0, 2, u, v)
    }
    #[inline(always)]
    fn parameter_range(&self) -> (ParameterRange, ParameterRange) {
        (
            (Bound::Unbounded, Bound::Unbounded),
            (Bound::Unbounded, Bound::Unbounded),
        )
    }
    #[inline(always)]
    fn try_range_tuple(&self) -> (Option<(f64, f64)>, Option<(f64, f64)>) {
        let (urange, vrange) = self.parameter_range();
        let closure = |(x, y)| bound2opt(x).and_then(move |x| bound2opt(y).map(move |y| (x, y)));
        (closure(urange), closure(vrange))
    }
}

impl<S: ParametricSurface> ParametricSurface for &S {
    type Point = S::Point;
    type Vector = S::Vector;
    #[inline(always)]
    fn subs(&self, u: f64, v: f64) -> Self::Point {
        (*self).subs(u, v)
    }
    #[inline(always)]
    fn der_mn(&self, m: usize, n: usize, u: f64, v: f64) -> Self::Vector {
        (*self).der_mn(m, n, u, v)
    }
    #[inline(always)]
    fn uder(&self, u: f64, v: f64) -> Self::Vector {
        (*self).uder(u, v)
    }
    #[inline(always)]
    fn vder(&self, u: f64, v: f64) -> Self::Vector {
        (*self).vder(u, v)
    }
    #[inline(always)]
    fn uuder(&self, u: f64, v: f64) -> Self::Vector {
        (*self).uuder(u, v)
    }
    #[inline(always)]
    fn uvder(&self, u: f64, v: f64) -> Self::Vector {
        (*self).uvder(u, v)
    }
    #[inline(always)]
    fn vvder(&self, u: f64, v: f64) -> Self::Vector {
        (*self).vvder(u, v)
    }
    #[inline(always)]
    fn parameter_range(&self) -> (ParameterRange, ParameterRange) {
        (*self).parameter_range()
    }
}

/// 3D parametric surface with a well-defined normal.
pub trait ParametricSurface3D: ParametricSurface<Point = Point3, Vector = Vector3> {
    /// Returns the normalized cross product of the first partial derivatives.
    #[inline(always)]
    fn normal(&self, u: f64, v: f64) -> Vector3 {
        self.uder(u, v).cross(self.vder(u, v)).normalize()
    }
}

impl<S: ParametricSurface3D> ParametricSurface3D for &S {
    #[inline(always)]
    fn normal(&self, u: f64, v: f64) -> Vector3 {
        (*self).normal(u, v)
    }
}

/// Parametric surface with a bounded parameter range in both directions.
pub trait BoundedSurface: ParametricSurface {
    #[inline(always)]
    fn range_tuple(&self) -> ((f64, f64), (f64, f64)) {
        let (urange, vrange) = self.try_range_tuple();
        (
            urange.expect(UNBOUNDED_ERROR),
            vrange.expect(UNBOUNDED_ERROR),
        )
    }
}

impl<S: BoundedSurface> BoundedSurface for &S {}

use super::*;

/// Dimension marker for parameter searches on curves.
#[derive(Clone, Copy, Debug)]
pub struct D1 {}
/// Dimension marker for parameter searches on surfaces.
#[derive(Clone, Copy, Debug)]
pub struct D2 {}

pub trait SPDimension {
    type Hint;
    type Parameter;
}

impl SPDimension for D1 {
    type Hint = SPHint1D;
    type Parameter = f64;
}

impl SPDimension for D2 {
    type Hint = SPHint2D;
    type Parameter = (f64, f64);
}

/// Hint for 1-dimensional parameter searches.
#[derive(Clone, Copy, Debug)]
pub enum SPHint1D {
    Parameter(f64),
    Range(f64, f64),
    None,
}

impl From<f64> for SPHint1D {
    #[inline(always)]
    fn from(x: f64) -> SPHint1D {
        SPHint1D::Parameter(x)
    }
}

impl From<(f64, f64)> for SPHint1D {
    #[inline(always)]
    fn from(range: (f64, f64)) -> SPHint1D {
        SPHint1D::Range(range.0, range.1)
    }
}

impl From<Option<f64>> for SPHint1D {
    #[inline(always)]
    fn from(x: Option<f64>) -> SPHint1D {
        match x {
            Some(x) => x.into(),
            None => SPHint1D::None,
        }
    }
}

/// Hint for 2-dimensional parameter searches.
#[derive(Clone, Copy, Debug)]
pub enum SPHint2D {
    Parameter(f64, f64),
    Range((f64, f64), (f64, f64)),
    None,
}

impl From<(f64, f64)> for SPHint2D {
    #[inline(always)]
    fn from(x: (f64, f64)) -> SPHint2D {
        SPHint2D::Parameter(x.0, x.1)
    }
}

impl From<((f64, f64), (f64, f64))> for SPHint2D {
    #[inline(always)]
    fn from(range: ((f64, f64), (f64, f64))) -> SPHint2D {
        SPHint2D::Range(range.0, range.1)
    }
}

impl From<Option<(f64, f64)>> for SPHint2D {
    #[inline(always)]
    fn from(x: Option<(f64, f64)>) -> SPHint2D {
        match x {
            Some(x) => x.into(),
            None => SPHint2D::None,
        }
    }
}

/// Searches a parameter at which the geometry passes through a given point.
/// Returns `None` when the point is not on the geometry.
pub trait SearchParameter<D: SPDimension> {
    type Point;
    fn search_parameter<H: Into<D::Hint>>(
        &self,
        point: Self::Point,
        hint: H,
        trials: usize,
    ) -> Option<D::Parameter>;
}

impl<D: SPDimension, T: SearchParameter<D>> SearchParameter<D> for &T {
    type Point = T::Point;
    fn search_parameter<H: Into<D::Hint>>(
        &self,
        point: T::Point,
        hint: H,
        trials: usize,
    ) -> Option<D::Parameter> {
        (*self).search_parameter(point, hint, trials)
    }
}

/// Searches the parameter of the closest position to a given point.
pub trait SearchNearestParameter<D: SPDimension> {
    type Point;
    fn search_nearest_parameter<H: Into<D::Hint>>(
        &self,
        point: Self::Point,
        hint: H,
        trials: usize,
    ) -> Option<D::Parameter>;
}

impl<D: SPDimension, T: SearchNearestParameter<D>> SearchNearestParameter<D> for &T {
    type Point = T::Point;
    fn search_nearest_parameter<H: Into<D::Hint>>(
        &self,
        point: T::Point,
        hint: H,
        trials: usize,
    ) -> Option<D::Parameter> {
        (*self).search_nearest_parameter(point, hint, trials)
    }
}

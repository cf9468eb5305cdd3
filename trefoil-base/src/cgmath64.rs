//! Type aliases fixing `cgmath` to double precision, plus the control point trait.
#![allow(missing_docs)]

pub use cgmath;
pub use cgmath::{
    AbsDiffEq, Angle, Deg, EuclideanSpace, InnerSpace, Matrix, MetricSpace, One, Rad, SquareMatrix,
    Transform, VectorSpace, Zero,
};

pub type Point1 = cgmath::Point1<f64>;
pub type Point2 = cgmath::Point2<f64>;
pub type Point3 = cgmath::Point3<f64>;
pub type Vector1 = cgmath::Vector1<f64>;
pub type Vector2 = cgmath::Vector2<f64>;
pub type Vector3 = cgmath::Vector3<f64>;
pub type Vector4 = cgmath::Vector4<f64>;
pub type Matrix2 = cgmath::Matrix2<f64>;
pub type Matrix3 = cgmath::Matrix3<f64>;
pub type Matrix4 = cgmath::Matrix4<f64>;

pub use crate::homogeneous::{rat_der, rat_ders, Homogeneous};

/// Normalizes `v`, falling back to the vector itself when its length is
/// degenerate. Callers that rely on the direction must validate upstream.
#[inline(always)]
pub fn safe_normalize(v: Vector3) -> Vector3 {
    use crate::tolerance::Origin;
    match v.magnitude2().so_small2() {
        true => v,
        false => v.normalize(),
    }
}

pub mod control_point {
    //! A unified trait for control points of any dimension.
    use cgmath::{
        BaseFloat, EuclideanSpace, Point1, Point2, Point3, Vector1, Vector2, Vector3, Vector4, Zero,
    };
    use std::fmt::Debug;
    use std::ops::*;

    /// NURBS/Bezier control point supporting affine arithmetic and indexing.
    pub trait ControlPoint<S>:
        Add<Self::Diff, Output = Self>
        + Sub<Self::Diff, Output = Self>
        + Sub<Self, Output = Self::Diff>
        + Mul<S, Output = Self>
        + Div<S, Output = Self>
        + AddAssign<Self::Diff>
        + SubAssign<Self::Diff>
        + MulAssign<S>
        + DivAssign<S>
        + Copy
        + Clone
        + Debug
        + PartialEq
        + Index<usize, Output = S>
        + IndexMut<usize, Output = S>
    {
        /// The difference vector associated with the point type.
        type Diff: Add<Self::Diff, Output = Self::Diff>
            + Sub<Self::Diff, Output = Self::Diff>
            + Mul<S, Output = Self::Diff>
            + Div<S, Output = Self::Diff>
            + AddAssign<Self::Diff>
            + SubAssign<Self::Diff>
            + MulAssign<S>
            + DivAssign<S>
            + Zero
            + Copy
            + Clone
            + Debug
            + Index<usize, Output = S>
            + IndexMut<usize, Output = S>;
        /// Dimension of the control point space.
        const DIM: usize;
        /// The origin point, or the zero vector.
        fn origin() -> Self;
        /// Converts the point into its difference vector.
        fn to_vec(self) -> Self::Diff;
        /// Builds the point back from a difference vector.
        fn from_vec(vec: Self::Diff) -> Self;
    }

    macro_rules! impl_control_point_for_point {
        ($point: ident, $vector: ident, $dim: expr) => {
            impl<S: BaseFloat> ControlPoint<S> for $point<S> {
                type Diff = $vector<S>;
                const DIM: usize = $dim;
                fn origin() -> Self {
                    EuclideanSpace::origin()
                }
                fn to_vec(self) -> Self::Diff {
                    EuclideanSpace::to_vec(self)
                }
                fn from_vec(vec: Self::Diff) -> Self {
                    EuclideanSpace::from_vec(vec)
                }
            }
        };
    }
    impl_control_point_for_point!(Point1, Vector1, 1);
    impl_control_point_for_point!(Point2, Vector2, 2);
    impl_control_point_for_point!(Point3, Vector3, 3);

    macro_rules! impl_control_point_for_vector {
        ($vector: ident, $dim: expr) => {
            impl<S: BaseFloat> ControlPoint<S> for $vector<S> {
                type Diff = $vector<S>;
                const DIM: usize = $dim;
                fn origin() -> Self {
                    Zero::zero()
                }
                fn to_vec(self) -> Self {
                    self
                }
                fn from_vec(vec: Self::Diff) -> Self {
                    vec
                }
            }
        };
    }
    impl_control_point_for_vector!(Vector2, 2);
    impl_control_point_for_vector!(Vector3, 3);
    impl_control_point_for_vector!(Vector4, 4);
}

#![allow(missing_docs)]

use cgmath::AbsDiffEq;
use std::fmt::Debug;

pub const TOLERANCE: f64 = 1.0e-6;

pub const TOLERANCE2: f64 = TOLERANCE * TOLERANCE;

pub trait Tolerance: AbsDiffEq<Epsilon = f64> + Debug {
    fn near(&self, other: &Self) -> bool {
        self.abs_diff_eq(other, TOLERANCE)
    }
    fn near2(&self, other: &Self) -> bool {
        self.abs_diff_eq(other, TOLERANCE2)
    }
}

impl<T: AbsDiffEq<Epsilon = f64> + Debug> Tolerance for T {}

pub trait Origin: Tolerance + cgmath::Zero {
    #[inline(always)]
    fn so_small(&self) -> bool {
        self.near(&Self::zero())
    }

    #[inline(always)]
    fn so_small2(&self) -> bool {
        self.near2(&Self::zero())
    }
}

impl<T: Tolerance + cgmath::Zero> Origin for T {}

/// Centralized numeric configuration passed into kernel entry points.
///
/// Every tolerance and iteration cap used by the higher layers lives here,
/// so callers tune one structure instead of chasing scattered constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    /// Coincidence distance for points considered equal.
    pub distance: f64,
    /// Reconstruction error allowed when removing a knot.
    pub knot_removal: f64,
    /// Acceptance distance for refined intersection candidates.
    pub intersection: f64,
    /// Allowed deviation of an approximated offset curve.
    pub offset_deviation: f64,
    /// Number of uniform samples seeding closest-position searches.
    pub presearch_division: usize,
    /// Iteration budget of Newton refinements.
    pub newton_trials: usize,
    /// Depth cap of the paired bounding-box subdivision.
    pub subdivision_depth: usize,
    /// Rounds of adaptive knot refinement in offset approximation.
    pub refinement_rounds: usize,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            distance: TOLERANCE,
            knot_removal: 1.0e-4,
            intersection: TOLERANCE,
            offset_deviation: 1.0e-2,
            presearch_division: 128,
            newton_trials: 100,
            subdivision_depth: 8,
            refinement_rounds: 10,
        }
    }
}

#[macro_export]
macro_rules! assert_near {
    ($left: expr, $right: expr $(,)?) => {{
        let (left, right) = ($left, $right);
        assert!(
            $crate::tolerance::Tolerance::near(&left, &right),
            "assertion failed: `left` is near `right`\nleft: {left:?},\nright: {right:?}",
        )
    }};
    ($left: expr, $right: expr, $($arg: tt)+) => {{
        let (left, right) = ($left, $right);
        assert!(
            $crate::tolerance::Tolerance::near(&left, &right),
            "assertion failed: `left` is near `right`\nleft: {left:?},\nright: {right:?}: {}",
            format_args!($($arg)+),
        )
    }};
}

#[macro_export]
macro_rules! assert_near2 {
    ($left: expr, $right: expr $(,)?) => {{
        let (left, right) = ($left, $right);
        assert!(
            $crate::tolerance::Tolerance::near2(&left, &right),
            "assertion failed: `left` is near `right`\nleft: {left:?},\nright: {right:?}",
        )
    }};
    ($left: expr, $right: expr, $($arg: tt)+) => {{
        let (left, right) = ($left, $right);
        assert!(
            $crate::tolerance::Tolerance::near2(&left, &right),
            "assertion failed: `left` is near `right`\nleft: {left:?},\nright: {right:?}: {}",
            format_args!($($arg)+),
        )
    }};
}

#[macro_export]
macro_rules! prop_assert_near {
    ($left: expr, $right: expr $(,)?) => {{
        let (left, right) = ($left, $right);
        prop_assert!(
            $crate::tolerance::Tolerance::near(&left, &right),
            "assertion failed: `left` is near `right`\nleft: {left:?},\nright: {right:?}",
        )
    }};
    ($left: expr, $right: expr, $($arg: tt)+) => {{
        let (left, right) = ($left, $right);
        prop_assert!(
            $crate::tolerance::Tolerance::near(&left, &right),
            "assertion failed: `left` is near `right`\nleft: {left:?}, right: {right:?}: {}",
            format_args!($($arg)+),
        )
    }};
}

#[test]
#[should_panic]
fn assert_near_without_msg() {
    assert_near!(1.0, 2.0)
}

#[test]
#[should_panic]
fn assert_near_with_msg() {
    assert_near!(1.0, 2.0, "{}", "test OK")
}

#[test]
#[should_panic]
fn assert_near2_without_msg() {
    assert_near2!(1.0, 2.0)
}

//! Axis-aligned bounding boxes over control polygons.

use cgmath::*;
use serde::*;
use std::cmp::Ordering;
use std::ops::Index;

/// The minimum and maximum corner of an axis-aligned box.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BoundingBox<V>(V, V);

/// A point type that can be enclosed by an axis-aligned box.
pub trait Bounded:
    Copy + MetricSpace<Metric = Self::Scalar> + Index<usize, Output = Self::Scalar> + PartialEq
{
    /// Scalar type of the coordinates.
    type Scalar: BaseFloat;
    /// The diagonal vector type.
    type Vector;
    #[doc(hidden)]
    fn infinity() -> Self;
    #[doc(hidden)]
    fn neg_infinity() -> Self;
    #[doc(hidden)]
    fn max(self, other: Self) -> Self;
    #[doc(hidden)]
    fn min(self, other: Self) -> Self;
    #[doc(hidden)]
    fn max_component(one: Self::Vector) -> Self::Scalar;
    #[doc(hidden)]
    fn diagonal(self, other: Self) -> Self::Vector;
    #[doc(hidden)]
    fn mid(self, other: Self) -> Self;
}

macro_rules! pr2 {
    ($a: expr, $b: expr) => {
        $b
    };
}
macro_rules! impl_bounded {
    ($typename: ident, $vectortype: ident, $($num: expr),*) => {
        impl<S: BaseFloat> Bounded for $typename<S> {
            type Scalar = S;
            type Vector = $vectortype<S>;
            fn infinity() -> $typename<S> {
                $typename::new($(pr2!($num, S::infinity())),*)
            }
            fn neg_infinity() -> $typename<S> {
                $typename::new($(pr2!($num, S::neg_infinity())),*)
            }
            fn max(self, other: Self) -> Self {
                $typename::new(
                    $(
                        if self[$num] < other[$num] {
                            other[$num]
                        } else {
                            self[$num]
                        }
                    ),*
                )
            }
            fn min(self, other: Self) -> Self {
                $typename::new(
                    $(
                        if self[$num] > other[$num] {
                            other[$num]
                        } else {
                            self[$num]
                        }
                    ),*
                )
            }
            fn max_component(one: Self::Vector) -> S {
                let mut max = S::neg_infinity();
                $(if max < one[$num] { max = one[$num] })*
                max
            }
            fn diagonal(self, other: Self) -> Self::Vector { self - other }
            fn mid(self, other: Self) -> Self {
                self + (other - self) / (S::one() + S::one())
            }
        }
    };
}
impl_bounded!(Vector2, Vector2, 0, 1);
impl_bounded!(Point2, Vector2, 0, 1);
impl_bounded!(Vector3, Vector3, 0, 1, 2);
impl_bounded!(Point3, Vector3, 0, 1, 2);
impl_bounded!(Vector4, Vector4, 0, 1, 2, 3);

impl<V: Bounded> Default for BoundingBox<V> {
    #[inline(always)]
    fn default() -> Self {
        BoundingBox(V::infinity(), V::neg_infinity())
    }
}

impl<V: Bounded> BoundingBox<V> {
    /// Creates an empty box.
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expands the box to include `point`.
    #[inline(always)]
    pub fn push(&mut self, point: V) {
        self.0 = self.0.min(point);
        self.1 = self.1.max(point);
    }

    /// Returns `true` if the box is empty, that is, the minimum exceeds the
    /// maximum in some coordinate.
    #[inline(always)]
    pub fn is_empty(self) -> bool {
        let delta = self.0.diagonal(self.1);
        V::max_component(delta) > V::Scalar::zero()
    }

    /// Returns the maximum corner.
    #[inline(always)]
    pub const fn max(self) -> V {
        self.1
    }

    /// Returns the minimum corner.
    #[inline(always)]
    pub const fn min(self) -> V {
        self.0
    }

    /// Returns the diagonal vector.
    #[inline(always)]
    pub fn diagonal(self) -> V::Vector {
        self.1.diagonal(self.0)
    }

    /// Returns the length of the diagonal.
    #[inline(always)]
    pub fn diameter(self) -> V::Scalar {
        match self.is_empty() {
            true => num_traits::Float::neg_infinity(),
            false => self.0.distance(self.1),
        }
    }

    /// Returns the largest single-coordinate extent.
    #[inline(always)]
    pub fn size(self) -> V::Scalar {
        V::max_component(self.diagonal())
    }

    /// Returns the center of the box.
    #[inline(always)]
    pub fn center(self) -> V {
        self.0.mid(self.1)
    }

    /// Returns `true` if `pt` lies inside or on the boundary.
    #[inline(always)]
    pub fn contains(self, pt: V) -> bool {
        self + BoundingBox(pt, pt) == self
    }

    /// Returns `true` if the box intersects `other`, touching included.
    #[inline(always)]
    pub fn intersects(&self, other: &Self) -> bool {
        let intersection = *self ^ *other;
        !intersection.is_empty()
    }
}

impl<V: Bounded> FromIterator<V> for BoundingBox<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> BoundingBox<V> {
        let mut bbox = BoundingBox::new();
        bbox.extend(iter);
        bbox
    }
}

impl<'a, V: Bounded> FromIterator<&'a V> for BoundingBox<V> {
    fn from_iter<I: IntoIterator<Item = &'a V>>(iter: I) -> BoundingBox<V> {
        let mut bbox = BoundingBox::new();
        bbox.extend(iter);
        bbox
    }
}

impl<V: Bounded> Extend<V> for BoundingBox<V> {
    #[inline(always)]
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        iter.into_iter().for_each(|point| self.push(point));
    }
}

impl<'a, V: Bounded> Extend<&'a V> for BoundingBox<V> {
    #[inline(always)]
    fn extend<I: IntoIterator<Item = &'a V>>(&mut self, iter: I) {
        iter.into_iter().for_each(|point| self.push(*point));
    }
}

impl<V: Bounded> std::ops::AddAssign<BoundingBox<V>> for BoundingBox<V> {
    /// Union of two boxes.
    #[inline(always)]
    fn add_assign(&mut self, other: BoundingBox<V>) {
        self.0 = self.0.min(other.0);
        self.1 = self.1.max(other.1);
    }
}

impl<V: Bounded> std::ops::Add<BoundingBox<V>> for BoundingBox<V> {
    type Output = BoundingBox<V>;

    #[inline(always)]
    fn add(mut self, other: BoundingBox<V>) -> BoundingBox<V> {
        self += other;
        self
    }
}

impl<V: Bounded> std::ops::BitXorAssign<BoundingBox<V>> for BoundingBox<V> {
    /// Intersection of two boxes.
    #[inline(always)]
    fn bitxor_assign(&mut self, other: BoundingBox<V>) {
        self.0 = self.0.max(other.0);
        self.1 = self.1.min(other.1);
    }
}

impl<V: Bounded> std::ops::BitXor<BoundingBox<V>> for BoundingBox<V> {
    type Output = BoundingBox<V>;

    #[inline(always)]
    fn bitxor(mut self, other: BoundingBox<V>) -> BoundingBox<V> {
        self ^= other;
        self
    }
}

impl<V: Bounded> PartialOrd for BoundingBox<V> {
    /// Inclusion order: a box is greater when it contains the other.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let max = *self + *other;
        match (self == &max, other == &max) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Greater),
            (false, true) => Some(Ordering::Less),
            (false, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    #[test]
    fn intersects_detects_overlap() {
        let mut a = BoundingBox::new();
        a.push(Point3::new(0.0, 0.0, 0.0));
        a.push(Point3::new(1.0, 1.0, 1.0));

        let mut b = BoundingBox::new();
        b.push(Point3::new(0.5, 0.5, 0.5));
        b.push(Point3::new(2.0, 2.0, 2.0));

        let mut c = BoundingBox::new();
        c.push(Point3::new(2.1, 0.0, 0.0));
        c.push(Point3::new(3.0, 1.0, 1.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn inclusion_order() {
        let outer: BoundingBox<Point3<f64>> = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 4.0, 4.0),
        ]
        .into_iter()
        .collect();
        let inner: BoundingBox<Point3<f64>> = [
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
        ]
        .into_iter()
        .collect();
        assert!(outer > inner);
        assert!(outer.contains(inner.center()));
    }
}

//! Homogeneous coordinates and the Leibniz-rule correction turning
//! homogeneous derivatives into rational ones.
#![allow(missing_docs)]

use cgmath::*;

/// A vector in homogeneous coordinates, the last component being the weight.
pub trait Homogeneous: VectorSpace {
    /// The associated point in Cartesian space.
    type Point: EuclideanSpace<Scalar = Self::Scalar>;
    /// Drops the weight component.
    fn truncate(self) -> <Self::Point as EuclideanSpace>::Diff;
    /// Returns the weight.
    fn weight(self) -> Self::Scalar;
    /// Builds a homogeneous vector from a point, with weight one.
    fn from_point(point: Self::Point) -> Self;
    /// Builds a homogeneous vector from a point and an arbitrary weight.
    #[inline(always)]
    fn from_point_weight(point: Self::Point, weight: Self::Scalar) -> Self {
        Self::from_point(point) * weight
    }
    /// Projects back to Cartesian space by dividing out the weight.
    #[inline(always)]
    fn to_point(self) -> Self::Point {
        Self::Point::from_vec(self.truncate() / self.weight())
    }
}

impl<S: BaseFloat> Homogeneous for Vector2<S> {
    type Point = Point1<S>;
    #[inline(always)]
    fn truncate(self) -> Vector1<S> {
        Vector1::new(self[0])
    }
    #[inline(always)]
    fn weight(self) -> S {
        self[1]
    }
    #[inline(always)]
    fn from_point(point: Self::Point) -> Self {
        Vector2::new(point[0], S::one())
    }
}

impl<S: BaseFloat> Homogeneous for Vector3<S> {
    type Point = Point2<S>;
    #[inline(always)]
    fn truncate(self) -> Vector2<S> {
        self.truncate()
    }
    #[inline(always)]
    fn weight(self) -> S {
        self[2]
    }
    #[inline(always)]
    fn from_point(point: Self::Point) -> Self {
        Vector3::new(point[0], point[1], S::one())
    }
}

impl<S: BaseFloat> Homogeneous for Vector4<S> {
    type Point = Point3<S>;
    #[inline(always)]
    fn truncate(self) -> Vector3<S> {
        self.truncate()
    }
    #[inline(always)]
    fn weight(self) -> S {
        self[3]
    }
    #[inline(always)]
    fn from_point(point: Self::Point) -> Self {
        point.to_homogeneous()
    }
}

/// Computes the highest-order rational derivative from an array of
/// homogeneous derivatives `[C(t), C'(t), ..]`. Low orders are expanded as
/// closed-form quotient rules, higher orders run the general recursion.
pub fn rat_der<V: Homogeneous>(ders: &[V]) -> <V::Point as EuclideanSpace>::Diff {
    let zero = <V::Point as EuclideanSpace>::Diff::zero();
    match ders.len() {
        0 => zero,
        1 => ders[0].to_point().to_vec(),
        2 => {
            let (s, sw) = (ders[0].truncate(), ders[0].weight());
            let (d, dw) = (ders[1].truncate(), ders[1].weight());
            (d * sw - s * dw) / (sw * sw)
        }
        3 => {
            let (s, sw) = (ders[0].truncate(), ders[0].weight());
            let (d, dw) = (ders[1].truncate(), ders[1].weight());
            let (d2, d2w) = (ders[2].truncate(), ders[2].weight());
            let two = <V::Scalar as num_traits::NumCast>::from(2).unwrap();
            let sw2 = sw * sw;
            d2 / sw - d * (dw / sw2 * two) + s * (dw * dw * two / (sw2 * sw) - d2w / sw2)
        }
        _ => {
            let mut evals = vec![zero; ders.len()];
            rat_ders(ders, &mut evals);
            evals[ders.len() - 1]
        }
    }
}

/// Fills `evals` with the rational derivatives of all orders up to
/// `ders.len() - 1`, applying the binomially weighted Leibniz correction.
pub fn rat_ders<V: Homogeneous>(ders: &[V], evals: &mut [<V::Point as EuclideanSpace>::Diff]) {
    assert!(evals.len() >= ders.len());
    let from = <V::Scalar as num_traits::NumCast>::from;
    for i in 0..ders.len() {
        let mut c = 1;
        let sum = (1..i).fold(evals[0] * ders[i].weight(), |sum, j| {
            c = c * (i - j + 1) / j;
            sum + evals[j] * (ders[i - j].weight() * from(c).unwrap())
        });
        evals[i] = (ders[i].truncate() - sum) / ders[0].weight();
    }
}

/// Mixed rational derivative of the highest orders from a grid of
/// homogeneous partials `ders[m][n]` (m-th u-derivative, n-th v-derivative).
pub fn multi_rat_der<V, A>(ders: &[A]) -> <V::Point as EuclideanSpace>::Diff
where
    V: Homogeneous,
    A: AsRef<[V]>,
{
    let zero = <V::Point as EuclideanSpace>::Diff::zero();
    if ders.is_empty() || ders[0].as_ref().is_empty() {
        return zero;
    }
    let (m, n) = (ders.len(), ders[0].as_ref().len());
    if m == 1 {
        rat_der(ders[0].as_ref())
    } else if n == 1 {
        let vders: Vec<V> = ders.iter().map(|array| array.as_ref()[0]).collect();
        rat_der(&vders)
    } else {
        let mut evals = vec![vec![zero; n]; m];
        multi_rat_ders(ders, &mut evals);
        evals[m - 1][n - 1]
    }
}

/// Simultaneous computation of all mixed rational derivatives.
pub fn multi_rat_ders<V, A0, A1>(ders: &[A0], evals: &mut [A1])
where
    V: Homogeneous,
    A0: AsRef<[V]>,
    A1: AsMut<[<V::Point as EuclideanSpace>::Diff]>,
{
    let from = <V::Scalar as num_traits::NumCast>::from;
    let (m_max, n_max) = (ders.len(), ders[0].as_ref().len());
    for m in 0..m_max {
        for n in 0..n_max {
            let mut sum = <V::Point as EuclideanSpace>::Diff::zero();
            let mut c0 = 1;
            for i in 0..=m {
                let mut c1 = 1;
                let (evals, ders) = (evals[i].as_mut(), ders[m - i].as_ref());
                for j in 0..=n {
                    if (i, j) != (m, n) {
                        let (c0_s, c1_s) = (from(c0).unwrap(), from(c1).unwrap());
                        sum = sum + evals[j] * (ders[n - j].weight() * c0_s * c1_s);
                    }
                    c1 = c1 * (n - j) / (j + 1);
                }
                c0 = c0 * (m - i) / (i + 1);
            }
            let (eval_mn, der_mn) = (&mut evals[m].as_mut()[n], ders[m].as_ref()[n]);
            *eval_mn = (der_mn.truncate() - sum) / ders[0].as_ref()[0].weight();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::AbsDiffEq;

    #[test]
    fn rat_der_of_weighted_line() {
        // C(t) = ((2t, 0, 0) * 2, 2): projects to (t, 0, 0).
        let ders = [
            Vector4::new(0.0, 0.0, 0.0, 2.0),
            Vector4::new(4.0, 0.0, 0.0, 0.0),
        ];
        let der = rat_der(&ders);
        assert!(der.abs_diff_eq(&Vector3::new(2.0, 0.0, 0.0), 1.0e-12));
    }

    #[test]
    fn rat_ders_consistent_with_rat_der() {
        let ders = [
            Vector4::new(1.0, 2.0, 3.0, 2.0),
            Vector4::new(0.5, -1.0, 0.25, 0.125),
            Vector4::new(-2.0, 0.5, 1.0, 0.0625),
            Vector4::new(0.75, 0.75, -0.5, 0.03125),
        ];
        let mut evals = [Vector3::new(0.0, 0.0, 0.0); 4];
        rat_ders(&ders, &mut evals);
        for order in 1..=4 {
            let single = rat_der(&ders[..order]);
            assert!(single.abs_diff_eq(&evals[order - 1], 1.0e-10));
        }
    }
}

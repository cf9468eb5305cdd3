use super::*;
use std::slice::SliceIndex;
use trefoil_base::tolerance::{Origin, Tolerance};

impl KnotVec {
    /// Creates an empty knot vector.
    pub const fn new() -> KnotVec {
        KnotVec(Vec::new())
    }

    /// Returns the length of the parameter domain, `0.0` when empty.
    #[inline(always)]
    pub fn range_length(&self) -> f64 {
        match self.is_empty() {
            true => 0.0,
            false => self[self.len() - 1] - self[0],
        }
    }

    #[inline(always)]
    pub fn same_range(&self, other: &KnotVec) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (false, false) => {
                self[0].near(&other[0]) && self.range_length().near(&other.range_length())
            }
            (true, true) => true,
            _ => false,
        }
    }

    #[inline(always)]
    pub fn remove(&mut self, idx: usize) -> f64 {
        self.0.remove(idx)
    }

    /// Returns the index of the last knot not exceeding `x`, located by
    /// binary search. `None` when `x` is below the first knot.
    #[inline(always)]
    pub fn floor(&self, x: f64) -> Option<usize> {
        match self.0.partition_point(|t| *t <= x) {
            0 => None,
            idx => Some(idx - 1),
        }
    }

    /// Returns the multiplicity of the `i`th knot.
    #[inline(always)]
    pub fn multiplicity(&self, i: usize) -> usize {
        self.iter().filter(|u| self[i].near(u)).count()
    }

    /// The Greville abscissae: the mean of each `degree`-wide interior knot
    /// window. For a clamped vector these are natural sampling parameters,
    /// one per control point.
    pub fn greville(&self, degree: usize) -> Vec<f64> {
        let n = self.len() - degree - 1;
        (0..n)
            .map(|i| self.0[i + 1..=i + degree].iter().sum::<f64>() / degree as f64)
            .collect()
    }

    /// Inserts `knot` keeping the vector sorted and returns the inserted
    /// index.
    #[inline(always)]
    pub fn add_knot(&mut self, knot: f64) -> usize {
        match self.floor(knot) {
            Some(idx) => {
                self.0.insert(idx + 1, knot);
                idx + 1
            }
            None => {
                self.0.insert(0, knot);
                0
            }
        }
    }

    /// Panicking version of [`KnotVec::try_bspline_basis_functions`].
    pub fn bspline_basis_functions(&self, degree: usize, der_rank: usize, t: f64) -> Vec<f64> {
        match self.try_bspline_basis_functions(degree, der_rank, t) {
            Ok(got) => got,
            Err(error) => panic!("{}", error),
        }
    }

    /// Evaluates the `der_rank`th derivative of all B-spline basis functions
    /// of the given `degree` at `t` by the triangular Cox-de Boor recurrence.
    ///
    /// The result has one entry per control point; entries outside the
    /// active span are zero. When `der_rank` exceeds `degree` every entry is
    /// zero. Parameters outside the domain evaluate at the nearest end.
    pub fn try_bspline_basis_functions(
        &self,
        degree: usize,
        der_rank: usize,
        t: f64,
    ) -> Result<Vec<f64>> {
        let n = self.len() - 1;
        if self[0].near(&self[n]) {
            return Err(Error::ZeroRange);
        } else if n < degree {
            return Err(Error::TooLargeDegree(n + 1, degree));
        }
        if degree < der_rank {
            return Ok(vec![0.0; n - degree]);
        }

        let idx = {
            let idx = self
                .floor(t)
                .unwrap_or_else(|| self.floor(self[0]).unwrap());
            if idx == n {
                n - self.multiplicity(n)
            } else {
                idx
            }
        };

        let mut eval = vec![0.0; n];
        self.sub_bspline_basis_functions(degree, der_rank, t, idx, &mut eval);
        eval.truncate(n - degree);
        Ok(eval)
    }

    fn sub_bspline_basis_functions(
        &self,
        degree: usize,
        der_rank: usize,
        t: f64,
        idx: usize,
        eval: &mut [f64],
    ) {
        let n = self.len() - 1;
        eval[idx] = 1.0;

        for k in 1..=(degree - der_rank) {
            let base = idx.saturating_sub(k);
            let delta = self[base + k] - self[base];
            let mut a = inv_or_zero(delta) * (t - self[base]);
            for i in base..=usize::min(idx, n - k - 1) {
                let delta = self[i + k + 1] - self[i + 1];
                let b = inv_or_zero(delta) * (self[i + k + 1] - t);
                eval[i] = a * eval[i] + b * eval[i + 1];
                a = 1.0 - b;
            }
        }

        for k in (degree - der_rank + 1)..=degree {
            let base = idx.saturating_sub(k);
            let delta = self[base + k] - self[base];
            let mut a = inv_or_zero(delta);
            for i in base..=usize::min(idx, n - k - 1) {
                let delta = self[i + k + 1] - self[i + 1];
                let b = inv_or_zero(delta);
                eval[i] = (a * eval[i] - b * eval[i + 1]) * k as f64;
                a = b;
            }
        }
    }

    /// Affine transform of all knots. `scalar` must be positive.
    pub fn transform(&mut self, scalar: f64, r#move: f64) -> &mut Self {
        assert!(scalar > 0.0, "The scalar {scalar} is not positive.");
        self.0
            .iter_mut()
            .for_each(move |vec| *vec = *vec * scalar + r#move);
        self
    }

    /// Maps the knots onto `[0, 1]`.
    pub fn try_normalize(&mut self) -> Result<&mut Self> {
        let range = self.range_length();
        if range.so_small() {
            return Err(Error::ZeroRange);
        }
        Ok(self.transform(1.0 / range, -self[0] / range))
    }

    #[inline(always)]
    pub fn normalize(&mut self) -> &mut Self {
        self.try_normalize()
            .unwrap_or_else(|error| panic!("{}", error))
    }

    pub fn translate(&mut self, x: f64) -> &mut Self {
        self.transform(1.0, x)
    }

    /// Inverts the knot vector in place, preserving the original range.
    pub fn invert(&mut self) -> &mut Self {
        let n = self.len();
        if n == 0 {
            return self;
        }
        let range = self[0] + self[n - 1];
        let clone = self.0.clone();
        for (knot1, knot0) in clone.iter().rev().zip(&mut self.0) {
            *knot0 = range - knot1;
        }
        self
    }

    /// Returns `true` when both end knots have multiplicity `degree + 1`.
    #[inline(always)]
    pub fn is_clamped(&self, degree: usize) -> bool {
        self.multiplicity(0) > degree && self.multiplicity(self.len() - 1) > degree
    }

    /// Concatenates two clamped knot vectors whose back and front agree,
    /// merging the shared knot into a single `degree + 1` multiplicity.
    pub fn try_concat(&mut self, other: &KnotVec, degree: usize) -> Result<&mut Self> {
        if !self.is_clamped(degree) || !other.is_clamped(degree) {
            return Err(Error::NotClampedKnotVector);
        }
        let back = self.0.last().unwrap();
        let front = other.0.first().unwrap();
        if front < back || !front.near(back) {
            return Err(Error::DifferentBackFront(*back, *front));
        }

        self.0.truncate(self.len() - degree - 1);
        self.0.extend(other.0.iter().copied());

        Ok(self)
    }

    #[inline(always)]
    pub fn concat(&mut self, other: &KnotVec, degree: usize) -> &mut Self {
        self.try_concat(other, degree)
            .unwrap_or_else(|error| panic!("{}", error))
    }

    #[inline(always)]
    pub fn sub_vec<I: SliceIndex<[f64], Output = [f64]>>(&self, range: I) -> KnotVec {
        KnotVec(Vec::from(&self.0[range]))
    }

    /// Splits into the distinct knots and their multiplicities.
    pub fn to_single_multi(&self) -> (Vec<f64>, Vec<usize>) {
        let mut knots = Vec::new();
        let mut mults = Vec::new();

        let mut iter = self.as_slice().iter().peekable();
        let mut mult = 1;
        while let Some(knot) = iter.next() {
            if let Some(next) = iter.peek() {
                if knot.near(next) {
                    mult += 1;
                } else {
                    knots.push(*knot);
                    mults.push(mult);
                    mult = 1;
                }
            } else {
                knots.push(*knot);
                mults.push(mult);
            }
        }
        (knots, mults)
    }

    pub fn from_single_multi(knots: Vec<f64>, mults: Vec<usize>) -> Result<KnotVec> {
        for i in 1..knots.len() {
            if knots[i - 1] > knots[i] {
                return Err(Error::NotSortedVector);
            }
        }

        let mut vec = Vec::new();
        for i in 0..knots.len() {
            for _ in 0..mults[i] {
                vec.push(knots[i]);
            }
        }
        Ok(KnotVec(vec))
    }

    pub fn try_from(vec: Vec<f64>) -> Result<KnotVec> {
        for i in 1..vec.len() {
            if vec[i - 1] > vec[i] {
                return Err(Error::NotSortedVector);
            }
        }
        Ok(KnotVec(vec))
    }

    /// The knot vector of a Bezier segment over `[0, 1]`.
    pub fn bezier_knot(degree: usize) -> KnotVec {
        let mut vec = vec![0.0; degree + 1];
        vec.extend(std::iter::repeat_n(1.0, degree + 1));
        KnotVec(vec)
    }

    /// A clamped knot vector over `[0, 1]` with uniform interior knots.
    pub fn uniform_knot(degree: usize, division: usize) -> KnotVec {
        let mut vec = vec![0.0; degree + 1];
        vec.extend((1..division).map(|i| i as f64 / division as f64));
        vec.extend(std::iter::repeat_n(1.0, degree + 1));
        KnotVec(vec)
    }
}

impl From<Vec<f64>> for KnotVec {
    fn from(mut vec: Vec<f64>) -> KnotVec {
        vec.sort_by(|a, b| a.partial_cmp(b).unwrap());
        KnotVec(vec)
    }
}

impl From<&[f64]> for KnotVec {
    #[inline(always)]
    fn from(vec: &[f64]) -> KnotVec {
        let mut copy_vec = vec.to_vec();
        copy_vec.sort_by(|a, b| a.partial_cmp(b).unwrap());
        KnotVec(copy_vec)
    }
}

impl From<KnotVec> for Vec<f64> {
    #[inline(always)]
    fn from(knotvec: KnotVec) -> Vec<f64> {
        knotvec.0
    }
}

impl FromIterator<f64> for KnotVec {
    #[inline(always)]
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> KnotVec {
        KnotVec::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a> IntoIterator for &'a KnotVec {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Deref for KnotVec {
    type Target = Vec<f64>;
    #[inline(always)]
    fn deref(&self) -> &Vec<f64> {
        &self.0
    }
}

impl AsRef<[f64]> for KnotVec {
    #[inline(always)]
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for KnotVec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let vec = Vec::<f64>::deserialize(deserializer)?;
        Self::try_from(vec).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_is_the_last_knot_not_exceeding() {
        let kv = KnotVec::try_from(vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(kv.floor(-0.1), None);
        assert_eq!(kv.floor(0.0), Some(2));
        assert_eq!(kv.floor(0.3), Some(2));
        assert_eq!(kv.floor(0.5), Some(3));
        assert_eq!(kv.floor(0.7), Some(3));
        assert_eq!(kv.floor(1.0), Some(6));
        assert_eq!(kv.floor(2.0), Some(6));
    }

    #[test]
    fn basis_functions_partition_unity() {
        let kv = KnotVec::uniform_knot(3, 4);
        for i in 0..=40 {
            let t = i as f64 / 40.0;
            let vals = kv.try_bspline_basis_functions(3, 0, t).unwrap();
            let sum: f64 = vals.iter().sum();
            trefoil_base::assert_near!(sum, 1.0);
            assert!(vals.iter().all(|v| *v >= -1.0e-12));
        }
    }

    #[test]
    fn basis_derivative_rank_beyond_degree_is_zero() {
        let kv = KnotVec::bezier_knot(2);
        let vals = kv.try_bspline_basis_functions(2, 3, 0.5).unwrap();
        assert!(vals.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn concat_merges_the_shared_knot() {
        let mut kv0 = KnotVec::bezier_knot(2);
        let mut kv1 = KnotVec::bezier_knot(2);
        kv1.translate(1.0);
        kv0.try_concat(&kv1, 2).unwrap();
        assert_eq!(
            kv0.as_slice(),
            &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0],
        );
    }

    #[test]
    fn single_multi_round_trip() {
        let kv = KnotVec::try_from(vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.5, 1.0, 1.0, 1.0]).unwrap();
        let (knots, mults) = kv.to_single_multi();
        assert_eq!(knots, vec![0.0, 0.25, 0.5, 1.0]);
        assert_eq!(mults, vec![3, 1, 2, 3]);
        assert_eq!(KnotVec::from_single_multi(knots, mults).unwrap(), kv);
    }
}

//! Dense Gaussian elimination with partial pivoting.
//!
//! This is the sole linear-algebra dependency of the interpolation layer.
//! The systems involved are small (one unknown per control point), so a
//! direct dense solve is sufficient; the right-hand side may be vector
//! valued, which solves all Cartesian components in one pass.

use std::ops::{Mul, Sub};

/// Solves `a * x = b`, consuming both. Returns `None` when the matrix is
/// singular up to the internal pivot threshold, in which case the caller
/// must treat the system as degenerate rather than use partial results.
pub fn solve<V>(mut a: Vec<Vec<f64>>, mut b: Vec<V>) -> Option<Vec<V>>
where
    V: Copy + Sub<Output = V> + Mul<f64, Output = V>,
{
    let n = a.len();
    if n == 0 || a.iter().any(|row| row.len() != n) || b.len() != n {
        return None;
    }

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() <= f64::EPSILON {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] = b[row] - b[col] * factor;
        }
    }

    for col in (0..n).rev() {
        let x = b[col] * (1.0 / a[col][col]);
        b[col] = x;
        for row in 0..col {
            let factor = a[row][col];
            b[row] = b[row] - x * factor;
        }
    }
    Some(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_near;
    use cgmath::Vector3;

    #[test]
    fn solve_scalar_system() {
        let a = vec![
            vec![2.0, 1.0, -1.0],
            vec![-3.0, -1.0, 2.0],
            vec![-2.0, 1.0, 2.0],
        ];
        let b = vec![8.0, -11.0, -3.0];
        let x = solve(a, b).unwrap();
        assert_near!(x[0], 2.0);
        assert_near!(x[1], 3.0);
        assert_near!(x[2], -1.0);
    }

    #[test]
    fn solve_requires_pivoting() {
        // zero leading coefficient forces a row swap
        let a = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let b = vec![3.0, 5.0];
        let x = solve(a, b).unwrap();
        assert_near!(x[0], 5.0);
        assert_near!(x[1], 3.0);
    }

    #[test]
    fn solve_vector_rhs() {
        let a = vec![vec![1.0, 1.0], vec![1.0, -1.0]];
        let b = vec![Vector3::new(2.0, 4.0, 0.0), Vector3::new(0.0, 2.0, 0.0)];
        let x = solve(a, b).unwrap();
        assert_near!(x[0], Vector3::new(1.0, 3.0, 0.0));
        assert_near!(x[1], Vector3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn singular_system_is_rejected() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        let b = vec![1.0, 2.0];
        assert!(solve(a, b).is_none());
    }
}

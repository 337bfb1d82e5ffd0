#![allow(non_snake_case)]

// Small column-major dense matrix type plus the factorizations
// needed by the dense KKT backend: a Cholesky factor of the
// (shifted) Hessian, and an upper triangular factor that can grow
// by one column or lose an arbitrary column.

use crate::algebra::{DenseFactorizationError, FloatT, MatrixShape, ShapedMatrix};
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Matrix<T> {
    pub m: usize,
    pub n: usize,
    /// vector of data in column major format
    pub data: Vec<T>,
}

impl<T: FloatT> Matrix<T> {
    pub fn zeros(size: (usize, usize)) -> Self {
        let (m, n) = size;
        Self {
            m,
            n,
            data: vec![T::zero(); m * n],
        }
    }

    pub fn col_slice(&self, col: usize) -> &[T] {
        assert!(col < self.n);
        &self.data[(col * self.m)..(col + 1) * self.m]
    }

    pub fn col_slice_mut(&mut self, col: usize) -> &mut [T] {
        assert!(col < self.n);
        &mut self.data[(col * self.m)..(col + 1) * self.m]
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;
    fn index(&self, idx: (usize, usize)) -> &T {
        &self.data[idx.0 + self.m * idx.1]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, idx: (usize, usize)) -> &mut T {
        &mut self.data[idx.0 + self.m * idx.1]
    }
}

impl<T> ShapedMatrix for Matrix<T> {
    fn nrows(&self) -> usize {
        self.m
    }
    fn ncols(&self) -> usize {
        self.n
    }
    fn shape(&self) -> MatrixShape {
        MatrixShape::N
    }
}

// ---------------------------------------------------------------
// Cholesky factorization A + shift*I = L*L'
// ---------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) struct CholeskyEngine<T> {
    /// lower triangular factor (stored as square dense)
    pub L: Matrix<T>,
    /// number of pivots replaced by dynamic regularization
    pub regularize_count: usize,
}

impl<T: FloatT> CholeskyEngine<T> {
    pub fn new(n: usize) -> Self {
        Self {
            L: Matrix::zeros((n, n)),
            regularize_count: 0,
        }
    }

    /// Factor the symmetric matrix `A` (only the lower triangle is read)
    /// shifted by `shift` on the diagonal.   If `dynamic` is `Some((eps,delta))`
    /// then any pivot smaller than `eps` is replaced with `delta`.
    pub fn factor(
        &mut self,
        A: &Matrix<T>,
        shift: T,
        dynamic: Option<(T, T)>,
    ) -> Result<(), DenseFactorizationError> {
        if A.size() != self.L.size() || !A.is_square() {
            return Err(DenseFactorizationError::IncompatibleDimension);
        }
        let n = A.n;
        let L = &mut self.L;
        L.data.fill(T::zero());
        self.regularize_count = 0;

        for j in 0..n {
            let mut d = A[(j, j)] + shift;
            for k in 0..j {
                d -= L[(j, k)] * L[(j, k)];
            }
            if let Some((eps, delta)) = dynamic {
                if d <= eps {
                    d = delta;
                    self.regularize_count += 1;
                }
            }
            if d <= T::zero() || !d.is_finite() {
                return Err(DenseFactorizationError::NotPositiveDefinite(j));
            }
            let ljj = d.sqrt();
            L[(j, j)] = ljj;

            for i in (j + 1)..n {
                let mut s = A[(i, j)];
                for k in 0..j {
                    s -= L[(i, k)] * L[(j, k)];
                }
                L[(i, j)] = s / ljj;
            }
        }
        Ok(())
    }

    /// Solve `L*x = b` in place
    pub fn solve_lower(&self, b: &mut [T]) {
        let L = &self.L;
        for j in 0..L.n {
            b[j] /= L[(j, j)];
            let bj = b[j];
            for i in (j + 1)..L.n {
                b[i] -= L[(i, j)] * bj;
            }
        }
    }

    /// Solve `L'*x = b` in place
    pub fn solve_lower_t(&self, b: &mut [T]) {
        let L = &self.L;
        for j in (0..L.n).rev() {
            let mut s = b[j];
            for i in (j + 1)..L.n {
                s -= L[(i, j)] * b[i];
            }
            b[j] = s / L[(j, j)];
        }
    }
}

// ---------------------------------------------------------------
// Upper triangular factor R with R'R = V'V for a matrix V whose
// columns are appended and deleted one at a time.
// ---------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) struct UpdatableTriangle<T> {
    R: Matrix<T>,
    /// current dimension, at most the capacity of R
    pub dim: usize,
}

impl<T: FloatT> UpdatableTriangle<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            R: Matrix::zeros((capacity, capacity)),
            dim: 0,
        }
    }

    pub fn clear(&mut self) {
        self.R.data.fill(T::zero());
        self.dim = 0;
    }

    /// Append a column `[r; rho]` to the factor.  The caller computes
    /// `r = R'^{-1} V'v` and `rho^2 = v'v - r'r` for the new column `v`.
    pub fn append(&mut self, r: &[T], rho2: T, tol: T) -> Result<(), DenseFactorizationError> {
        let q = self.dim;
        if q >= self.R.n || r.len() != q {
            return Err(DenseFactorizationError::IncompatibleDimension);
        }
        if rho2.is_nan() || rho2 <= tol {
            return Err(DenseFactorizationError::RankDeficient);
        }
        self.R.col_slice_mut(q)[..q].copy_from_slice(r);
        self.R[(q, q)] = rho2.sqrt();
        self.dim += 1;
        Ok(())
    }

    /// Delete column `k`, then restore triangular form with Givens
    /// rotations applied to consecutive row pairs.
    pub fn delete(&mut self, k: usize) {
        let q = self.dim;
        assert!(k < q);
        let R = &mut self.R;

        for col in k..(q - 1) {
            for row in 0..q {
                R[(row, col)] = R[(row, col + 1)];
            }
        }
        for row in 0..q {
            R[(row, q - 1)] = T::zero();
        }

        // columns k..q-1 now have one subdiagonal entry each
        for i in k..(q - 1) {
            let (a, b) = (R[(i, i)], R[(i + 1, i)]);
            if b == T::zero() {
                continue;
            }
            let h = T::hypot(a, b);
            let (c, s) = (a / h, b / h);
            for col in i..(q - 1) {
                let (x, y) = (R[(i, col)], R[(i + 1, col)]);
                R[(i, col)] = c * x + s * y;
                R[(i + 1, col)] = -s * x + c * y;
            }
            R[(i + 1, i)] = T::zero();
        }
        self.dim -= 1;
    }

    /// Solve `R*x = b` in place over the leading `dim` entries
    pub fn solve_upper(&self, b: &mut [T]) {
        let R = &self.R;
        for j in (0..self.dim).rev() {
            b[j] /= R[(j, j)];
            let bj = b[j];
            for i in 0..j {
                b[i] -= R[(i, j)] * bj;
            }
        }
    }

    /// Solve `R'*x = b` in place over the leading `dim` entries
    pub fn solve_upper_t(&self, b: &mut [T]) {
        let R = &self.R;
        for j in 0..self.dim {
            let mut s = b[j];
            for i in 0..j {
                s -= R[(i, j)] * b[i];
            }
            b[j] = s / R[(j, j)];
        }
    }

    #[cfg(test)]
    fn gram(&self) -> Matrix<T> {
        let q = self.dim;
        let mut G = Matrix::zeros((q, q));
        for i in 0..q {
            for j in 0..q {
                for k in 0..q {
                    G[(i, j)] += self.R[(k, i)] * self.R[(k, j)];
                }
            }
        }
        G
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algebra::VectorMath;

    fn from_rows<const N: usize>(rows: &[[f64; N]]) -> Matrix<f64> {
        let mut M = Matrix::zeros((rows.len(), N));
        for (i, row) in rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                M[(i, j)] = v;
            }
        }
        M
    }

    #[test]
    fn test_cholesky_solve() {
        #[rustfmt::skip]
        let S = from_rows(&[
            [ 8., -2., 4.],
            [-2., 12., 2.],
            [ 4.,  2., 6.]]);

        let mut eng = CholeskyEngine::<f64>::new(3);
        assert!(eng.factor(&S, 0., None).is_ok());

        // S*x = b  via L and L'
        let b = [1., 2., 3.];
        let mut x = b.to_vec();
        eng.solve_lower(&mut x);
        eng.solve_lower_t(&mut x);

        let mut Sx = [0.; 3];
        for i in 0..3 {
            for j in 0..3 {
                Sx[i] += S[(i, j)] * x[j];
            }
        }
        assert!(Sx.norm_inf_diff(&b) < 1e-12);
    }

    #[test]
    fn test_cholesky_indefinite() {
        let S = from_rows(&[[1., 2.], [2., 1.]]);
        let mut eng = CholeskyEngine::<f64>::new(2);
        assert_eq!(
            eng.factor(&S, 0., None),
            Err(DenseFactorizationError::NotPositiveDefinite(1))
        );

        // a zero matrix is fine once pivots are regularized
        let Z = Matrix::zeros((2, 2));
        assert!(eng.factor(&Z, 0., Some((1e-13, 1e-7))).is_ok());
        assert_eq!(eng.regularize_count, 2);
    }

    #[test]
    fn test_triangle_append_delete() {
        // columns of V, appended one at a time
        let V = [[1., 0., 0.], [1., 1., 0.], [0., 1., 2.]];
        let mut tri = UpdatableTriangle::<f64>::new(3);

        for (q, v) in V.iter().enumerate() {
            let mut r: Vec<f64> = V[..q].iter().map(|u| u.dot(v)).collect();
            tri.solve_upper_t(&mut r);
            let rho2 = v.sumsq() - r.sumsq();
            tri.append(&r, rho2, 1e-12).unwrap();
        }
        assert_eq!(tri.dim, 3);

        // dropping the middle column must leave the Gram
        // matrix of the remaining two columns
        tri.delete(1);
        let G = tri.gram();
        let keep = [V[0], V[2]];
        for i in 0..2 {
            for j in 0..2 {
                assert!((G[(i, j)] - keep[i].dot(&keep[j])).abs() < 1e-12);
            }
        }

        // a dependent column is rejected
        let v = [2., 1., 2.];
        let mut r: Vec<f64> = keep.iter().map(|u| u.dot(&v)).collect();
        tri.solve_upper_t(&mut r);
        let rho2 = v.sumsq() - r.sumsq();
        assert_eq!(
            tri.append(&r, rho2, 1e-10),
            Err(DenseFactorizationError::RankDeficient)
        );
    }
}

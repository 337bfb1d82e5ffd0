use crate::algebra::*;
use std::iter::zip;

impl<T: FloatT> MatrixVectorMultiply for CscMatrix<T> {
    type T = T;

    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        _csc_axpby_N(self, y, x, a, b);
    }
}

impl<T: FloatT> MatrixVectorMultiply for Adjoint<'_, CscMatrix<T>> {
    type T = T;

    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        _csc_axpby_T(self.src, y, x, a, b);
    }
}

impl<T: FloatT> SymMatrixVectorMultiply for Symmetric<'_, CscMatrix<T>> {
    type T = T;

    fn symv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        _csc_symv_unsafe(self.src, y, x, a, b);
    }
}

impl<T: FloatT> MatrixMath for CscMatrix<T> {
    type T = T;

    fn scale(&mut self, c: T) {
        self.nzval.scale(c);
    }

    fn col_norms(&self, norms: &mut [T]) {
        norms.fill(T::zero());
        self.col_norms_no_reset(norms);
    }

    fn col_norms_no_reset(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.n);

        for (col, v) in norms.iter_mut().enumerate() {
            let vals = &self.nzval[self.colptr[col]..self.colptr[col + 1]];
            *v = vals.iter().fold(*v, |m, &x| T::max(m, T::abs(x)));
        }
    }

    fn col_norms_sym(&self, norms: &mut [T]) {
        norms.fill(T::zero());
        self.col_norms_sym_no_reset(norms);
    }

    fn col_norms_sym_no_reset(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.n);

        for col in 0..self.n {
            for ptr in self.colptr[col]..self.colptr[col + 1] {
                let absv = T::abs(self.nzval[ptr]);
                let row = self.rowval[ptr];
                norms[col] = T::max(norms[col], absv);
                norms[row] = T::max(norms[row], absv);
            }
        }
    }

    fn row_norms(&self, norms: &mut [T]) {
        norms.fill(T::zero());
        self.row_norms_no_reset(norms);
    }

    fn row_norms_no_reset(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.m);

        for (&row, &val) in zip(&self.rowval, &self.nzval) {
            norms[row] = T::max(norms[row], T::abs(val));
        }
    }

    fn lscale(&mut self, l: &[T]) {
        for (val, row) in zip(&mut self.nzval, &self.rowval) {
            *val *= l[*row];
        }
    }

    fn rscale(&mut self, r: &[T]) {
        assert_eq!(r.len(), self.n);
        for (col, &rc) in r.iter().enumerate() {
            self.nzval[self.colptr[col]..self.colptr[col + 1]].scale(rc);
        }
    }

    fn lrscale(&mut self, l: &[T], r: &[T]) {
        assert_eq!(r.len(), self.n);

        for (col, &rc) in r.iter().enumerate() {
            let (first, last) = (self.colptr[col], self.colptr[col + 1]);
            let vals = &mut self.nzval[first..last];
            let rows = &self.rowval[first..last];

            for (val, row) in zip(vals, rows) {
                *val *= l[*row] * rc;
            }
        }
    }

    fn quad_form(&self, y: &[T], x: &[T]) -> T {
        _csc_quad_form(self, y, x)
    }
}

// Safety: x and y are checked against the dimensions of A, so this is
// sound provided A has rowval and colptr arrays consistent with its
// dimension, i.e. A passes check_format.  The KKT products in iterative
// refinement go through here on every step.
#[allow(non_snake_case)]
fn _csc_symv_unsafe<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    _scale_or_zero(y, b);

    assert!(x.len() == A.n);
    assert!(y.len() == A.n);
    assert!(A.n == A.m);
    assert!(A.colptr.len() == A.n + 1);
    unsafe {
        for (col, &xcol) in x.iter().enumerate() {
            let first = *A.colptr.get_unchecked(col);
            let last = *A.colptr.get_unchecked(col + 1);

            for j in first..last {
                let row = *A.rowval.get_unchecked(j);
                let Aij = *A.nzval.get_unchecked(j);
                *y.get_unchecked_mut(row) += a * Aij * xcol;

                if row != col {
                    //don't double up on the diagonal
                    *y.get_unchecked_mut(col) += a * Aij * (*x.get_unchecked(row));
                }
            }
        }
    }
}

#[allow(non_snake_case)]
fn _csc_quad_form<T: FloatT>(M: &CscMatrix<T>, y: &[T], x: &[T]) -> T {
    assert_eq!(M.n, M.m);
    assert_eq!(x.len(), M.n);
    assert_eq!(y.len(), M.n);

    let mut out = T::zero();

    for col in 0..M.n {
        let mut xsum = T::zero();
        let mut ysum = T::zero();

        let rng = M.colptr[col]..M.colptr[col + 1];
        for (&Mv, &row) in zip(&M.nzval[rng.clone()], &M.rowval[rng]) {
            assert!(row <= col, "Input matrix should be triu form.");
            if row == col {
                out += Mv * x[col] * y[col];
            } else {
                xsum += Mv * x[row];
                ysum += Mv * y[row];
            }
        }
        out += xsum * y[col] + ysum * x[col];
    }
    out
}

// y = b*y, treating b == 0 as an overwrite so that
// NaNs in uninitialized y don't survive
fn _scale_or_zero<T: FloatT>(y: &mut [T], b: T) {
    if b == T::zero() {
        y.fill(T::zero());
    } else if b != T::one() {
        y.scale(b);
    }
}

// sparse matrix-vector multiply, no transpose
#[allow(non_snake_case)]
fn _csc_axpby_N<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    assert_eq!(x.len(), A.n);
    assert_eq!(y.len(), A.m);

    _scale_or_zero(y, b);
    if a == T::zero() {
        return;
    }

    for (col, &xc) in x.iter().enumerate() {
        let axc = a * xc;
        for ptr in A.colptr[col]..A.colptr[col + 1] {
            y[A.rowval[ptr]] += A.nzval[ptr] * axc;
        }
    }
}

// sparse matrix-vector multiply, transposed
#[allow(non_snake_case)]
fn _csc_axpby_T<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    assert_eq!(x.len(), A.m);
    assert_eq!(y.len(), A.n);

    _scale_or_zero(y, b);
    if a == T::zero() {
        return;
    }

    for (col, yc) in y.iter_mut().enumerate() {
        *yc += a * A.col_dot(col, x);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_matrix() -> CscMatrix<f64> {
        // A = [1 0 2]
        //     [0 3 4]
        CscMatrix::from(&[[1., 0., 2.], [0., 3., 4.]])
    }

    #[test]
    fn test_gemv() {
        let A = test_matrix();
        let mut y = vec![1., 1.];
        A.gemv(&mut y, &[1., 1., 1.], 2., -1.);
        assert_eq!(y, vec![5., 13.]);

        let mut z = vec![f64::NAN; 3];
        A.t().gemv(&mut z, &[1., -1.], 1., 0.);
        assert_eq!(z, vec![1., -3., -2.]);
    }

    #[test]
    fn test_symv_and_quad_form() {
        // H = [4 1; 1 2] stored triu
        let H = CscMatrix::from(&[[4., 1.], [0., 2.]]);
        let x = [1., -1.];
        let mut y = vec![0.; 2];
        H.sym().symv(&mut y, &x, 1., 0.);
        assert_eq!(y, vec![3., -1.]);
        assert_eq!(H.quad_form(&x, &x), 4.);
    }

    #[test]
    fn test_norms_and_scaling() {
        let mut A = test_matrix();
        let mut cn = vec![0.; 3];
        let mut rn = vec![0.; 2];
        A.col_norms(&mut cn);
        A.row_norms(&mut rn);
        assert_eq!(cn, vec![1., 3., 4.]);
        assert_eq!(rn, vec![2., 4.]);

        A.lrscale(&[2., 1.], &[1., 1., 0.5]);
        assert_eq!(A.nzval, vec![2., 3., 2., 2.]);

        let H = CscMatrix::from(&[[4., -5.], [0., 2.]]);
        let mut hn = vec![0.; 2];
        H.col_norms_sym(&mut hn);
        assert_eq!(hn, vec![5., 5.]);
    }
}

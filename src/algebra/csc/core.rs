#![allow(non_snake_case)]

use crate::algebra::{Adjoint, FloatT, MatrixShape, ShapedMatrix, SparseFormatError, Symmetric};
use std::iter::zip;

/// Sparse matrix in standard Compressed Sparse Column (CSC) format
///
/// __Example usage__ : To construct the 3 x 3 matrix
/// ```text
/// A = [1.  3.  5.]
///     [2.  0.  6.]
///     [0.  4.  7.]
/// ```
///
/// ```no_run
/// use dasqp::algebra::CscMatrix;
///
/// let A : CscMatrix<f64> = CscMatrix::new(
///    3,                                // m
///    3,                                // n
///    vec![0, 2, 4, 7],                 //colptr
///    vec![0, 1, 0, 2, 0, 1, 2],        //rowval
///    vec![1., 2., 3., 4., 5., 6., 7.], //nzval
///  );
///
/// // optional correctness check
/// assert!(A.check_format().is_ok());
///
/// ```
///

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CscMatrix<T = f64> {
    /// number of rows
    pub m: usize,
    /// number of columns
    pub n: usize,
    /// CSC format column pointer.
    ///
    /// Ths field should have length `n+1`. The last entry corresponds
    /// to the the number of nonzeros and should agree with the lengths
    /// of the `rowval` and `nzval` fields.
    pub colptr: Vec<usize>,
    /// vector of row indices
    pub rowval: Vec<usize>,
    /// vector of non-zero matrix elements
    pub nzval: Vec<T>,
}

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    /// `CscMatrix` constructor.
    ///
    /// # Panics
    /// Makes rudimentary dimensional compatibility checks and panics on
    /// failure.   This constructor does __not__
    /// ensure that rows indices are all in bounds or that data is arranged
    /// such that entries within each column appear in order of increasing
    /// row index.   Use [`check_format`](CscMatrix::check_format) for that.
    ///

    pub fn new(m: usize, n: usize, colptr: Vec<usize>, rowval: Vec<usize>, nzval: Vec<T>) -> Self {
        assert_eq!(rowval.len(), nzval.len());
        assert_eq!(colptr.len(), n + 1);
        assert_eq!(colptr[n], rowval.len());
        CscMatrix {
            m,
            n,
            colptr,
            rowval,
            nzval,
        }
    }

    /// allocate space for a sparse matrix with `nnz` elements
    pub fn spalloc(m: usize, n: usize, nnz: usize) -> Self {
        let mut colptr = vec![0; n + 1];
        let rowval = vec![0; nnz];
        let nzval = vec![T::zero(); nnz];
        colptr[n] = nnz;

        CscMatrix::new(m, n, colptr, rowval, nzval)
    }

    /// An `m x n` matrix with no structural nonzeros
    ///
    /// ```no_run
    /// use dasqp::algebra::CscMatrix;
    /// let A : CscMatrix<f64> = CscMatrix::zeros((0,4));
    /// ```
    pub fn zeros(size: (usize, usize)) -> Self {
        Self::spalloc(size.0, size.1, 0)
    }

    /// Identity matrix of size `n`
    pub fn identity(n: usize) -> Self {
        let colptr = (0usize..=n).collect();
        let rowval = (0usize..n).collect();
        let nzval = vec![T::one(); n];

        CscMatrix::new(n, n, colptr, rowval, nzval)
    }

    /// number of nonzeros
    pub fn nnz(&self) -> usize {
        self.colptr[self.n]
    }

    /// transpose view
    pub fn t(&self) -> Adjoint<'_, Self> {
        Adjoint { src: self }
    }

    /// symmetric view
    pub fn sym(&self) -> Symmetric<'_, Self> {
        debug_assert!(self.is_triu());
        Symmetric { src: self }
    }

    /// Check that matrix data is correctly formatted.
    pub fn check_format(&self) -> Result<(), SparseFormatError> {
        if self.rowval.len() != self.nzval.len() {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        if self.colptr.is_empty()
            || (self.colptr.len() - 1) != self.n
            || self.colptr[self.n] != self.rowval.len()
        {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        //check for colptr monotonicity
        if self.colptr.windows(2).any(|c| c[0] > c[1]) {
            return Err(SparseFormatError::BadColptr);
        }

        //check for rowval monotonicity within each column
        for col in 0..self.n {
            let rng = self.colptr[col]..self.colptr[col + 1];
            if self.rowval[rng].windows(2).any(|c| c[0] >= c[1]) {
                return Err(SparseFormatError::BadRowOrdering);
            }
        }
        //check for row values out of bounds
        if !self.rowval.iter().all(|r| r < &self.m) {
            return Err(SparseFormatError::BadRowval);
        }

        Ok(())
    }

    /// Allocates a new matrix holding the transpose of `self`.
    /// Row indices in each column of the output are sorted.
    pub fn transpose(&self) -> Self {
        let mut At = CscMatrix::spalloc(self.n, self.m, self.nnz());

        // count entries in each row of self, i.e. each column of At
        for &row in self.rowval.iter() {
            At.colptr[row] += 1;
        }
        At.colcount_to_colptr();

        // visiting columns in order keeps At's row indices sorted
        for col in 0..self.n {
            for ptr in self.colptr[col]..self.colptr[col + 1] {
                let row = self.rowval[ptr];
                let dest = At.colptr[row];
                At.rowval[dest] = col;
                At.nzval[dest] = self.nzval[ptr];
                At.colptr[row] += 1;
            }
        }
        At.backshift_colptrs();
        At
    }

    /// Allocates a new matrix containing only entries from the upper triangular part
    pub fn to_triu(&self) -> Self {
        assert_eq!(self.m, self.n);
        let (m, n) = (self.m, self.n);
        let mut colptr = vec![0; n + 1];

        for col in 0..n {
            let rows = &self.rowval[self.colptr[col]..self.colptr[col + 1]];
            colptr[col + 1] = colptr[col] + rows.iter().filter(|&row| *row <= col).count();
        }

        let nnz = colptr[n];
        let mut rowval = Vec::with_capacity(nnz);
        let mut nzval = Vec::with_capacity(nnz);

        for col in 0..n {
            let rng = self.colptr[col]..self.colptr[col + 1];
            for (&row, &val) in zip(&self.rowval[rng.clone()], &self.nzval[rng]) {
                if row <= col {
                    rowval.push(row);
                    nzval.push(val);
                }
            }
        }
        CscMatrix::new(m, n, colptr, rowval, nzval)
    }

    /// True if the matrix is upper triangular
    pub fn is_triu(&self) -> bool {
        // check lower triangle for any structural entries, regardless
        // of the values that may be assigned to them
        for col in 0..self.ncols() {
            let rows = &self.rowval[self.colptr[col]..self.colptr[col + 1]];
            if rows.iter().any(|&row| row > col) {
                return false;
            }
        }
        true
    }

    /// Inner product of column `col` with the dense vector `x`
    pub fn col_dot(&self, col: usize, x: &[T]) -> T {
        assert_eq!(x.len(), self.m);
        let rng = self.colptr[col]..self.colptr[col + 1];
        zip(&self.rowval[rng.clone()], &self.nzval[rng])
            .fold(T::zero(), |acc, (&row, &v)| acc + v * x[row])
    }

    /// Produces `y += a * A[:,col]`
    pub fn col_axpy(&self, col: usize, a: T, y: &mut [T]) {
        assert_eq!(y.len(), self.m);
        let rng = self.colptr[col]..self.colptr[col + 1];
        for (&row, &v) in zip(&self.rowval[rng.clone()], &self.nzval[rng]) {
            y[row] += a * v;
        }
    }

    /// Dense copy of a single column
    pub(crate) fn col_to_dense(&self, col: usize, out: &mut [T]) {
        out.fill(T::zero());
        self.col_axpy(col, T::one(), out);
    }

    /// Returns the value at the given (row,col) index as an Option.
    /// Returns None if the given index is not a structural nonzero.
    ///
    /// # Panics
    /// Panics if the given index is out of bounds.
    pub fn get_entry(&self, idx: (usize, usize)) -> Option<T> {
        let (row, col) = idx;
        assert!(row < self.nrows() && col < self.ncols());

        let first = self.colptr[col];
        let last = self.colptr[col + 1];
        let rows_in_this_column = &self.rowval[first..last];
        match rows_in_this_column.binary_search(&row) {
            Ok(idx) => Some(self.nzval[first + idx]),
            Err(_) => None,
        }
    }
}

impl<T, const M: usize, const N: usize> From<&[[T; N]; M]> for CscMatrix<T>
where
    T: FloatT,
{
    /// Sparse copy of a dense row-major array.  Zero entries are dropped.
    fn from(rows: &[[T; N]; M]) -> Self {
        let mut colptr = vec![0; N + 1];
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();

        for col in 0..N {
            for (r, row) in rows.iter().enumerate() {
                if row[col] != T::zero() {
                    rowval.push(r);
                    nzval.push(row[col]);
                }
            }
            colptr[col + 1] = rowval.len();
        }
        CscMatrix::new(M, N, colptr, rowval, nzval)
    }
}

impl<T> ShapedMatrix for CscMatrix<T> {
    fn nrows(&self) -> usize {
        self.m
    }
    fn ncols(&self) -> usize {
        self.n
    }
    fn size(&self) -> (usize, usize) {
        (self.m, self.n)
    }
    fn shape(&self) -> MatrixShape {
        MatrixShape::N
    }
    fn is_square(&self) -> bool {
        self.m == self.n
    }
}

#[test]
fn test_csc_get_entry() {
    // A =
    //[ ⋅   4.0    ⋅    ⋅   12.0]
    //[1.0  5.0    ⋅    ⋅     ⋅ ]
    //[ ⋅   6.0    ⋅    ⋅   13.0]
    //[2.0  7.0  10.0   ⋅     ⋅ ]
    //[ ⋅   8.0  11.0   ⋅   14.0]
    //[3.0  9.0    ⋅    ⋅     ⋅ ]

    let A = CscMatrix::new(
        6,                                                                 // m
        5,                                                                 // n
        vec![0, 3, 9, 11, 11, 14],                                         // colptr
        vec![1, 3, 5, 0, 1, 2, 3, 4, 5, 3, 4, 0, 2, 4],                    // rowval
        vec![1., 2., 3., 4., 5., 6., 7., 8., 9., 10., 11., 12., 13., 14.], // nzval
    );

    assert_eq!(A.get_entry((1, 0)).unwrap(), 1.);
    assert_eq!(A.get_entry((5, 1)).unwrap(), 9.);
    assert_eq!(A.get_entry((4, 4)).unwrap(), 14.);
    assert!(A.get_entry((0, 0)).is_none());
    assert!(A.get_entry((2, 3)).is_none());

    // transposing twice recovers the original
    let At = A.transpose();
    assert!(At.check_format().is_ok());
    assert_eq!(At.get_entry((4, 2)).unwrap(), 13.);
    assert_eq!(At.transpose(), A);
}

#[test]
fn test_csc_from_dense_and_columns() {
    let A = CscMatrix::from(&[[1., 0., 2.], [0., 3., 4.]]);
    assert_eq!(A.size(), (2, 3));
    assert_eq!(A.nnz(), 4);
    assert!(A.check_format().is_ok());

    assert_eq!(A.col_dot(2, &[1., -1.]), -2.);

    let mut y = vec![1., 1.];
    A.col_axpy(1, 2., &mut y);
    assert_eq!(y, vec![1., 7.]);
}

#[test]
fn test_csc_to_triu() {
    let A = CscMatrix::from(&[[4., 1.], [1., 2.]]);
    let U = A.to_triu();
    assert!(U.is_triu());
    assert!(!A.is_triu());
    assert_eq!(U.nnz(), 3);
    assert_eq!(U.get_entry((0, 1)).unwrap(), 1.);
}

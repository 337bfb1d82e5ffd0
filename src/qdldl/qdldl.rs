#![allow(non_snake_case)]
use crate::algebra::*;
use derive_builder::Builder;
use std::iter::zip;
use thiserror::Error;

/// Error codes returnable from [`QDLDLFactorisation`](QDLDLFactorisation) factor operations

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QDLDLError {
    #[error("Matrix dimension fields are incompatible")]
    IncompatibleDimension,
    #[error("Matrix has a zero column")]
    EmptyColumn,
    #[error("Matrix is not upper triangular")]
    NotUpperTriangular,
    #[error("Matrix factorization produced a zero pivot")]
    ZeroPivot,
    #[error("Invalid permutation vector")]
    InvalidPermutation,
    #[error("Fill reducing ordering failed")]
    OrderingFailed,
}

/// Required settings for [`QDLDLFactorisation`](QDLDLFactorisation)

#[derive(Builder, Debug, Clone)]
pub struct QDLDLSettings<T: FloatT> {
    /// multiplier on the AMD dense row threshold
    #[builder(default = "1.0")]
    amd_dense_scale: f64,
    /// user supplied ordering.  AMD is used if `None`
    #[builder(default = "None", setter(strip_option))]
    perm: Option<Vec<usize>>,
    /// expected sign of each pivot, for dynamic regularization
    #[builder(default = "None", setter(strip_option))]
    Dsigns: Option<Vec<i8>>,
    #[builder(default = "true")]
    regularize_enable: bool,
    #[builder(default = "(1e-12).as_T()")]
    regularize_eps: T,
    #[builder(default = "(1e-7).as_T()")]
    regularize_delta: T,
}

impl<T> Default for QDLDLSettings<T>
where
    T: FloatT,
{
    fn default() -> QDLDLSettings<T> {
        QDLDLSettingsBuilder::<T>::default().build().unwrap()
    }
}

/// Performs $LDL^T$ factorization of a symmetric quasidefinite matrix.
///
/// The sparsity pattern is fixed at construction.   Values can be
/// changed afterwards with [`update_values`](QDLDLFactorisation::update_values)
/// or [`offset_values`](QDLDLFactorisation::offset_values), indexing
/// entries of the original input matrix, and are then picked up by
/// [`refactor`](QDLDLFactorisation::refactor).

#[derive(Debug)]
pub struct QDLDLFactorisation<T = f64> {
    // fill reducing permutation
    pub perm: Vec<usize>,
    // strictly lower triangular factor, unit diagonal implied
    pub L: CscMatrix<T>,
    // D and its inverse for PAP' = LDL'
    pub D: Vec<T>,
    pub Dinv: Vec<T>,
    workspace: QDLDLWorkspace<T>,
}

impl<T> QDLDLFactorisation<T>
where
    T: FloatT,
{
    pub fn new(
        Ain: &CscMatrix<T>,
        opts: Option<QDLDLSettings<T>>,
    ) -> Result<QDLDLFactorisation<T>, QDLDLError> {
        check_structure(Ain)?;
        let opts = opts.unwrap_or_default();
        let n = Ain.nrows();

        let (perm, iperm) = match opts.perm {
            Some(p) => {
                let ip = _invperm(&p)?;
                (p, ip)
            }
            None => _get_amd_ordering(Ain, opts.amd_dense_scale)?,
        };

        let (triuA, AtoPAPt) = _permute_symmetric(Ain, &iperm);

        let mut Dsigns = vec![1_i8; n];
        if let Some(ds) = opts.Dsigns {
            if ds.len() != n {
                return Err(QDLDLError::IncompatibleDimension);
            }
            _permute(&mut Dsigns, &ds, &perm);
        }

        let mut workspace = QDLDLWorkspace {
            etree: vec![NO_PARENT; n],
            Lnz: vec![0; n],
            next_free: vec![0; n],
            reach: Vec::with_capacity(n),
            path: Vec::with_capacity(n),
            marks: vec![false; n],
            yvals: vec![T::zero(); n],
            positive_inertia: 0,
            triuA,
            AtoPAPt,
            Dsigns,
            regularize_enable: opts.regularize_enable,
            regularize_eps: opts.regularize_eps,
            regularize_delta: opts.regularize_delta,
            regularize_count: 0,
        };
        workspace.elimination_tree();

        let nnzL = workspace.Lnz.iter().sum();
        let mut factors = QDLDLFactorisation {
            perm,
            L: CscMatrix::spalloc(n, n, nnzL),
            D: vec![T::zero(); n],
            Dinv: vec![T::zero(); n],
            workspace,
        };
        factors.refactor()?;
        Ok(factors)
    }

    /// number of positive pivots in D
    pub fn positive_inertia(&self) -> usize {
        self.workspace.positive_inertia
    }

    /// number of pivots replaced by dynamic regularization
    pub fn regularize_count(&self) -> usize {
        self.workspace.regularize_count
    }

    /// enable or disable pivot replacement for subsequent refactors
    pub fn set_regularize_enable(&mut self, enable: bool) {
        self.workspace.regularize_enable = enable;
    }

    /// Solves `Ax = b` using the current factors, with x replacing b
    pub fn solve(&mut self, b: &mut [T]) {
        assert_eq!(b.len(), self.D.len());

        let tmp = &mut self.workspace.yvals;
        _permute(tmp, b, &self.perm);
        _solve(&self.L, &self.Dinv, tmp);
        _ipermute(b, tmp, &self.perm);

        // yvals doubles as factorization scratch and must be left zeroed
        tmp.fill(T::zero());
    }

    /// Overwrite entries of the input matrix, indexed by their
    /// position in the input's `nzval`.  Takes effect on `refactor`.
    pub fn update_values(&mut self, indices: &[usize], values: &[T]) {
        assert_eq!(indices.len(), values.len());
        let nzval = &mut self.workspace.triuA.nzval;
        let AtoPAPt = &self.workspace.AtoPAPt;

        for (&idx, &v) in zip(indices, values) {
            nzval[AtoPAPt[idx]] = v;
        }
    }

    /// Add `offset * sign` to entries of the input matrix.  Takes
    /// effect on `refactor`.
    pub fn offset_values(&mut self, indices: &[usize], offset: T, signs: &[i8]) {
        assert_eq!(indices.len(), signs.len());
        let nzval = &mut self.workspace.triuA.nzval;
        let AtoPAPt = &self.workspace.AtoPAPt;

        for (&idx, &sign) in zip(indices, signs) {
            let sign: T = T::from_i8(sign).unwrap();
            nzval[AtoPAPt[idx]] += offset * sign;
        }
    }

    /// Numeric factorization of the current values
    pub fn refactor(&mut self) -> Result<(), QDLDLError> {
        self.workspace
            .factor_numeric(&mut self.L, &mut self.D, &mut self.Dinv)
    }
}

fn check_structure<T: FloatT>(A: &CscMatrix<T>) -> Result<(), QDLDLError> {
    if !A.is_square() {
        return Err(QDLDLError::IncompatibleDimension);
    }

    if !A.is_triu() {
        return Err(QDLDLError::NotUpperTriangular);
    }

    //every column needs at least its diagonal
    if !A.colptr.windows(2).all(|c| c[0] < c[1]) {
        return Err(QDLDLError::EmptyColumn);
    }

    Ok(())
}

const NO_PARENT: usize = usize::MAX;

#[derive(Debug)]
struct QDLDLWorkspace<T> {
    // elimination tree and column counts of L
    etree: Vec<usize>,
    Lnz: Vec<usize>,

    // scratch for the up-looking factorization
    next_free: Vec<usize>,
    reach: Vec<usize>,
    path: Vec<usize>,
    marks: Vec<bool>,
    yvals: Vec<T>,

    // number of positive values in D
    positive_inertia: usize,

    // permuted triu matrix PAP' that is actually factored, and
    // the map from entries of the input to entries of PAP'
    triuA: CscMatrix<T>,
    AtoPAPt: Vec<usize>,

    //regularization signs and parameters
    Dsigns: Vec<i8>,
    regularize_enable: bool,
    regularize_eps: T,
    regularize_delta: T,
    regularize_count: usize,
}

impl<T> QDLDLWorkspace<T>
where
    T: FloatT,
{
    // Elimination tree of triuA, plus the number of
    // subdiagonal nonzeros in each column of L
    fn elimination_tree(&mut self) {
        let A = &self.triuA;
        let n = A.n;
        // reuse next_free to record the last row that visited each node
        let visited = &mut self.next_free;

        self.Lnz.fill(0);
        self.etree.fill(NO_PARENT);

        for j in 0..n {
            visited[j] = j;
            for &row in &A.rowval[A.colptr[j]..A.colptr[j + 1]] {
                let mut i = row;
                while visited[i] != j {
                    if self.etree[i] == NO_PARENT {
                        self.etree[i] = j;
                    }
                    self.Lnz[i] += 1;
                    visited[i] = j;
                    i = self.etree[i];
                }
            }
        }
    }

    // Up-looking LDL' factorization.  Row k of L solves a triangular
    // system against the leading k x k block, with the nonzero pattern
    // of that row given by the etree reach of column k of triuA.
    fn factor_numeric(
        &mut self,
        L: &mut CscMatrix<T>,
        D: &mut [T],
        Dinv: &mut [T],
    ) -> Result<(), QDLDLError> {
        let A = &self.triuA;
        let n = A.n;

        L.colptr[0] = 0;
        for j in 0..n {
            L.colptr[j + 1] = L.colptr[j] + self.Lnz[j];
        }
        self.next_free.copy_from_slice(&L.colptr[0..n]);
        self.marks.fill(false);
        self.yvals.fill(T::zero());
        D.fill(T::zero());

        self.regularize_count = 0;
        self.positive_inertia = 0;

        for k in 0..n {
            self.reach.clear();

            for ptr in A.colptr[k]..A.colptr[k + 1] {
                let row = A.rowval[ptr];
                if row == k {
                    D[k] = A.nzval[ptr];
                    continue;
                }
                self.yvals[row] = A.nzval[ptr];

                // walk up the etree until we hit a marked node or k
                self.path.clear();
                let mut node = row;
                while node != NO_PARENT && node < k && !self.marks[node] {
                    self.marks[node] = true;
                    self.path.push(node);
                    node = self.etree[node];
                }
                self.reach.extend(self.path.iter().rev());
            }

            // eliminate in topological order
            for &col in self.reach.iter().rev() {
                let ycol = self.yvals[col];
                let (first, last) = (L.colptr[col], self.next_free[col]);
                for ptr in first..last {
                    self.yvals[L.rowval[ptr]] -= L.nzval[ptr] * ycol;
                }

                let lkc = ycol * Dinv[col];
                L.rowval[last] = k;
                L.nzval[last] = lkc;
                self.next_free[col] += 1;
                D[k] -= ycol * lkc;

                self.yvals[col] = T::zero();
                self.marks[col] = false;
            }

            if self.regularize_enable {
                let sign = T::from_i8(self.Dsigns[k]).unwrap();
                if D[k] * sign < self.regularize_eps {
                    D[k] = self.regularize_delta * sign;
                    self.regularize_count += 1;
                }
            }

            if D[k] == T::zero() || !D[k].is_finite() {
                return Err(QDLDLError::ZeroPivot);
            }
            if D[k] > T::zero() {
                self.positive_inertia += 1;
            }
            Dinv[k] = T::recip(D[k]);
        }

        Ok(())
    }
}

// Solves (L+I)x = b, with x replacing b
fn _lsolve<T: FloatT>(L: &CscMatrix<T>, x: &mut [T]) {
    for i in 0..x.len() {
        let xi = x[i];
        let rng = L.colptr[i]..L.colptr[i + 1];
        for (&row, &v) in zip(&L.rowval[rng.clone()], &L.nzval[rng]) {
            x[row] -= v * xi;
        }
    }
}

// Solves (L+I)'x = b, with x replacing b
fn _ltsolve<T: FloatT>(L: &CscMatrix<T>, x: &mut [T]) {
    for i in (0..x.len()).rev() {
        let rng = L.colptr[i]..L.colptr[i + 1];
        let s = zip(&L.rowval[rng.clone()], &L.nzval[rng])
            .fold(T::zero(), |acc, (&row, &v)| acc + v * x[row]);
        x[i] -= s;
    }
}

// Solves (L+I)D(L+I)'x = b, with x replacing b
fn _solve<T: FloatT>(L: &CscMatrix<T>, Dinv: &[T], b: &mut [T]) {
    _lsolve(L, b);
    b.hadamard(Dinv);
    _ltsolve(L, b);
}

// Construct an inverse permutation from a permutation
fn _invperm(p: &[usize]) -> Result<Vec<usize>, QDLDLError> {
    let mut ip = vec![usize::MAX; p.len()];

    for (i, &j) in p.iter().enumerate() {
        if j >= p.len() || ip[j] != usize::MAX {
            return Err(QDLDLError::InvalidPermutation);
        }
        ip[j] = i;
    }
    Ok(ip)
}

fn _permute<T: Copy>(x: &mut [T], b: &[T], p: &[usize]) {
    zip(p, x).for_each(|(p, x)| *x = b[*p]);
}

fn _ipermute<T: Copy>(x: &mut [T], b: &[T], p: &[usize]) {
    zip(p, b).for_each(|(p, b)| x[*p] = *b);
}

// Symmetric permutation PAP' of a triu matrix, returned in triu form
// along with the position of each input entry in the output.  Row
// indices within each output column are not sorted.
fn _permute_symmetric<T: FloatT>(A: &CscMatrix<T>, iperm: &[usize]) -> (CscMatrix<T>, Vec<usize>) {
    let n = A.n;
    let mut P = CscMatrix::<T>::spalloc(n, n, A.nnz());
    let mut AtoPAPt = vec![0; A.nnz()];

    // count entries landing in each column of P
    P.colptr.fill(0);
    for col in 0..n {
        for &row in &A.rowval[A.colptr[col]..A.colptr[col + 1]] {
            let pcol = usize::max(iperm[row], iperm[col]);
            P.colptr[pcol] += 1;
        }
    }
    P.colcount_to_colptr();

    for col in 0..n {
        for ptr in A.colptr[col]..A.colptr[col + 1] {
            let (pr, pc) = (iperm[A.rowval[ptr]], iperm[col]);
            let pcol = usize::max(pr, pc);
            let dest = P.colptr[pcol];
            P.rowval[dest] = usize::min(pr, pc);
            P.nzval[dest] = A.nzval[ptr];
            AtoPAPt[ptr] = dest;
            P.colptr[pcol] += 1;
        }
    }
    P.backshift_colptrs();

    (P, AtoPAPt)
}

fn _get_amd_ordering<T: FloatT>(
    A: &CscMatrix<T>,
    amd_dense_scale: f64,
) -> Result<(Vec<usize>, Vec<usize>), QDLDLError> {
    let mut control = amd::Control::default();
    control.dense *= amd_dense_scale;
    let (perm, iperm, _info) = amd::order(A.nrows(), &A.colptr, &A.rowval, &control)
        .map_err(|_| QDLDLError::OrderingFailed)?;
    Ok((perm, iperm))
}

//configure tests of internals
#[path = "test.rs"]
#[cfg(test)]
mod test;

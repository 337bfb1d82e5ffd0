#![allow(non_snake_case)]

use crate::algebra::*;

// Positions of the problem data within the nzval of the assembled
// KKT matrix.  H, At and Bt index the entries of the corresponding
// input matrices.  diag_full indexes the whole diagonal, including
// the structural zeros filled in during assembly.
pub(crate) struct LDLDataMap {
    pub H: Vec<usize>,
    pub At: Vec<usize>,
    pub Bt: Vec<usize>,
    pub diag_full: Vec<usize>,
}

impl LDLDataMap {
    pub fn new<T: FloatT>(H: &CscMatrix<T>, At: &CscMatrix<T>, Bt: &CscMatrix<T>) -> Self {
        let dim = H.n + At.n + Bt.n;
        Self {
            H: vec![0; H.nnz()],
            At: vec![0; At.nnz()],
            Bt: vec![0; Bt.nnz()],
            diag_full: vec![0; dim],
        }
    }

    // KKT entries holding the coupling of inequality row i
    pub fn Bt_column(&self, Bt: &CscMatrix<impl FloatT>, i: usize) -> &[usize] {
        &self.Bt[Bt.colptr[i]..Bt.colptr[i + 1]]
    }
}

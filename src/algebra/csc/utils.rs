//---------------------------------------------------------
// low-level internal utilities for counting / filling entries
// in block partitioned sparse matrices.  Counting passes
// accumulate per-column totals in colptr, which is then
// converted to offsets.  Filling passes use colptr as the
// next free slot of each column and are followed by a
// backshift to recover the usual column pointers.
//---------------------------------------------------------

use crate::algebra::{CscMatrix, FloatT};

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    // increment the self.colptr by the number of nonzeros in
    // each column of M, with M placed starting at column initcol
    pub(crate) fn colcount_block(&mut self, M: &CscMatrix<T>, initcol: usize) {
        for i in 0..M.n {
            self.colptr[initcol + i] += M.colptr[i + 1] - M.colptr[i];
        }
    }

    // increment the self.colptr by one for a diagonal
    // entry in each of blockcols columns
    pub(crate) fn colcount_diag(&mut self, initcol: usize, blockcols: usize) {
        let cols = self.colptr[initcol..(initcol + blockcols)].iter_mut();
        cols.for_each(|x| *x += 1);
    }

    // counts places where the square triu matrix M
    // has a missing diagonal entry
    pub(crate) fn colcount_missing_diag(&mut self, M: &CscMatrix<T>, initcol: usize) {
        assert_eq!(M.colptr.len(), M.n + 1);
        assert!(self.colptr.len() >= M.n + initcol);

        for i in 0..M.n {
            if M.colptr[i] == M.colptr[i + 1] || M.rowval[M.colptr[i + 1] - 1] != i {
                self.colptr[i + initcol] += 1;
            }
        }
    }

    pub(crate) fn colcount_to_colptr(&mut self) {
        let mut currentptr = 0;
        for p in &mut self.colptr {
            let count = *p;
            *p = currentptr;
            currentptr += count;
        }
    }

    pub(crate) fn backshift_colptrs(&mut self) {
        self.colptr.rotate_right(1);
        self.colptr[0] = 0;
    }

    // copy values of M into the block with top left corner
    // at (initrow,initcol), recording where each entry of M
    // lands in MtoKKT
    pub(crate) fn fill_block(
        &mut self,
        M: &CscMatrix<T>,
        MtoKKT: &mut [usize],
        initrow: usize,
        initcol: usize,
    ) {
        assert_eq!(MtoKKT.len(), M.nnz());
        for col in 0..M.n {
            for ptr in M.colptr[col]..M.colptr[col + 1] {
                let kcol = initcol + col;
                let dest = self.colptr[kcol];
                self.rowval[dest] = initrow + M.rowval[ptr];
                self.nzval[dest] = M.nzval[ptr];
                self.colptr[kcol] += 1;
                MtoKKT[ptr] = dest;
            }
        }
    }

    // place structural zeros on the diagonal of blockcols columns
    pub(crate) fn fill_diag(&mut self, initcol: usize, blockcols: usize) {
        for col in initcol..(initcol + blockcols) {
            let dest = self.colptr[col];
            self.rowval[dest] = col;
            self.nzval[dest] = T::zero();
            self.colptr[col] += 1;
        }
    }

    // same as fill_diag, but only where the square triu
    // matrix M has a missing diagonal entry
    pub(crate) fn fill_missing_diag(&mut self, M: &CscMatrix<T>, initcol: usize) {
        for i in 0..M.n {
            if M.colptr[i] == M.colptr[i + 1] || M.rowval[M.colptr[i + 1] - 1] != i {
                let dest = self.colptr[i + initcol];
                self.rowval[dest] = i + initcol;
                self.nzval[dest] = T::zero();
                self.colptr[i + initcol] += 1;
            }
        }
    }
}

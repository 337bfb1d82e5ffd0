#![allow(non_snake_case)]

use super::datamap::*;
use crate::algebra::*;

// Assemble the full triu KKT matrix
//
//     [ H   A'  B']
//     [     0   0 ]
//     [         0 ]
//
// with every diagonal entry structurally present.  The constraint
// blocks are supplied transposed (At is n x me, Bt is n x mi) so
// they can be placed column by column.

pub(crate) fn assemble_kkt_matrix<T: FloatT>(
    H: &CscMatrix<T>,
    At: &CscMatrix<T>,
    Bt: &CscMatrix<T>,
) -> (CscMatrix<T>, LDLDataMap) {
    let (n, me, mi) = (H.n, At.n, Bt.n);
    let dim = n + me + mi;
    let mut map = LDLDataMap::new(H, At, Bt);

    // use K.colptr to hold nnz entries in each column
    let mut K = CscMatrix::<T>::spalloc(dim, dim, 0);
    K.colptr.fill(0);
    K.colcount_block(H, 0);
    K.colcount_missing_diag(H, 0);
    K.colcount_block(At, n);
    K.colcount_block(Bt, n + me);
    K.colcount_diag(n, me + mi);

    let nnzKKT: usize = K.colptr.iter().sum();
    K.rowval.resize(nnzKKT, 0);
    K.nzval.resize(nnzKKT, T::zero());

    // cumsum total entries to convert to K.colptr
    K.colcount_to_colptr();

    K.fill_block(H, &mut map.H, 0, 0);
    // after adding H, since triu form
    K.fill_missing_diag(H, 0);
    K.fill_block(At, &mut map.At, 0, n);
    K.fill_block(Bt, &mut map.Bt, 0, n + me);
    K.fill_diag(n, me + mi);

    // backshift the colptrs to recover K.colptr again
    K.backshift_colptrs();

    // matrix is triu, so diagonal is last in each column
    for (d, &end) in map.diag_full.iter_mut().zip(&K.colptr[1..]) {
        *d = end - 1;
    }

    (K, map)
}

#[test]
fn test_kkt_assembly() {
    // H has no entry at (1,1)
    let H = CscMatrix::from(&[
        [4., 1.], //
        [0., 0.], //
    ]);
    let A = CscMatrix::from(&[[1., 1.]]);
    let B = CscMatrix::from(&[
        [2., 0.],  //
        [0., -3.], //
    ]);
    let (K, map) = assemble_kkt_matrix(&H, &A.transpose(), &B.transpose());

    let K_true = CscMatrix::from(&[
        [4., 1., 1., 2., 0.],  //
        [0., 0., 1., 0., -3.], //
        [0., 0., 0., 0., 0.],  //
        [0., 0., 0., 0., 0.],  //
        [0., 0., 0., 0., 0.],  //
    ]);

    assert!(K.check_format().is_ok());
    assert!(K.is_triu());
    assert_eq!(K.nnz(), 10);
    for col in 0..5 {
        for row in 0..=col {
            let v = K.get_entry((row, col)).unwrap_or(0.);
            assert_eq!(v, K_true.get_entry((row, col)).unwrap_or(0.));
        }
    }

    // every diagonal entry is present and last in its column
    for (col, &d) in map.diag_full.iter().enumerate() {
        assert_eq!(K.rowval[d], col);
    }

    // the maps point back at the input data
    for (ptr, &kidx) in map.H.iter().enumerate() {
        assert_eq!(K.nzval[kidx], H.nzval[ptr]);
    }
    let Bt = B.transpose();
    assert_eq!(map.Bt_column(&Bt, 1).len(), 1);
    assert_eq!(K.nzval[map.Bt_column(&Bt, 1)[0]], -3.);
}

use super::*;
use crate::algebra::{CscMatrix, VectorMath};

fn test_matrix_4x4() -> CscMatrix<f64> {
    // A =
    //[ 8.0  -3.0   2.0    ⋅ ]
    //[  ⋅    8.0  -1.0    ⋅ ]
    //[  ⋅     ⋅    8.0  -1.0]
    //[  ⋅     ⋅     ⋅    1.0]
    CscMatrix::new(
        4,
        4,
        vec![0, 1, 3, 6, 8],
        vec![0, 0, 1, 0, 1, 2, 2, 3],
        vec![8., -3., 8., 2., -1., 8., -1., 1.],
    )
}

fn test_matrix_quasidef() -> CscMatrix<f64> {
    // A = [1.0  1.0]
    //     [ ⋅  -1.0]
    CscMatrix::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![1., 1., -1.])
}

fn natural_order(n: usize) -> QDLDLSettings<f64> {
    QDLDLSettingsBuilder::default()
        .perm((0..n).collect())
        .build()
        .unwrap()
}

#[test]
fn test_invperm() {
    assert_eq!(_invperm(&[3, 0, 2, 1]).unwrap(), vec![1, 3, 2, 0]);

    //repeated index
    assert_eq!(_invperm(&[3, 0, 2, 0]), Err(QDLDLError::InvalidPermutation));
    //index too big
    assert_eq!(_invperm(&[4, 0, 2, 1]), Err(QDLDLError::InvalidPermutation));
}

#[test]
fn test_permute() {
    let perm = vec![3, 0, 2, 1];
    let b = vec![1., 2., 3., 4.];
    let mut x = vec![0.; 4];
    let mut y = vec![0.; 4];

    _permute(&mut x, &b, &perm);
    assert_eq!(x, vec![4., 1., 3., 2.]);

    _ipermute(&mut y, &x, &perm);
    assert_eq!(y, b);
}

#[test]
fn test_solve_from_factors() {
    //L =
    //[ ⋅    ⋅     ⋅    ⋅ ]
    //[1.0   ⋅     ⋅    ⋅ ]
    //[2.0  1.0    ⋅    ⋅ ]
    //[ ⋅   7.0  -3.0   ⋅ ]
    let L = CscMatrix::new(
        4,
        4,
        vec![0, 2, 4, 5, 5],
        vec![1, 2, 2, 3, 3],
        vec![1., 2., 1., 7., -3.],
    );
    let dinv = [0.25, -1.0, -0.5, 1.0];
    let x = vec![-3., 2., 1., 4.];

    let mut b = vec![-3., -1., -3., 15.];
    _lsolve(&L, &mut b);
    assert_eq!(b, x);

    let mut b = vec![1., 31., -11., 4.];
    _ltsolve(&L, &mut b);
    assert_eq!(b, x);

    let mut b = vec![4., -27., -1., -279.];
    _solve(&L, &dinv, &mut b);
    assert_eq!(b, x);
}

#[test]
fn test_etree() {
    let A = test_matrix_4x4();
    let factors = QDLDLFactorisation::new(&A, Some(natural_order(4))).unwrap();

    assert_eq!(factors.workspace.etree, vec![1, 2, 3, NO_PARENT]);
    assert_eq!(factors.workspace.Lnz, vec![2, 1, 1, 0]);
    assert_eq!(factors.L.nnz(), 4);
}

#[test]
fn test_amd() {
    let A = test_matrix_4x4();
    let (perm, iperm) = _get_amd_ordering(&A, 1.5).unwrap();
    assert_eq!(perm, [3, 0, 1, 2]);
    assert_eq!(iperm, [1, 2, 3, 0]);
}

#[test]
fn test_permute_symmetric() {
    //no permutation at all
    let A = test_matrix_4x4();
    let (P, AtoPAPt) = _permute_symmetric(&A, &[0, 1, 2, 3]);

    assert_eq!(&A, &P);
    let linearidx: Vec<usize> = (0..AtoPAPt.len()).collect();
    assert_eq!(&linearidx, &AtoPAPt);

    // with a permutation.  Row indices within each output
    // column are left in the order they were encountered
    let mut A = test_matrix_4x4();
    for (i, v) in A.nzval.iter_mut().enumerate() {
        *v = i as f64 + 1.;
    }

    let iperm = _invperm(&[2, 3, 0, 1]).unwrap();
    let (P, AtoPAPt) = _permute_symmetric(&A, &iperm);

    assert_eq!(&P.colptr, &vec![0, 1, 3, 5, 8]);
    assert_eq!(&P.rowval, &vec![0, 0, 1, 2, 0, 2, 3, 0]);
    assert_eq!(&P.nzval, &vec![6.0, 7.0, 8.0, 1.0, 4.0, 2.0, 3.0, 5.0]);
    assert_eq!(&AtoPAPt, &vec![3, 5, 6, 4, 7, 0, 1, 2]);
}

#[test]
fn test_settings_builder() {
    let opts = QDLDLSettings::<f64>::default();
    assert_eq!(opts.regularize_eps, 1e-12);
    assert!(opts.perm.is_none());

    let opts = QDLDLSettingsBuilder::default()
        .perm(vec![0, 1, 2, 3])
        .Dsigns(vec![1, 1, -1, -1])
        .regularize_eps(1e-3)
        .regularize_delta(1e-3)
        .build()
        .unwrap();

    assert_eq!(opts.regularize_eps, 1e-3);
    assert_eq!(opts.regularize_delta, 1e-3);
    assert_eq!(opts.Dsigns, Some(vec![1, 1, -1, -1]));
}

#[test]
fn test_solve_basic() {
    let A = test_matrix_4x4();
    let x = [1., -2., 3., -4.];

    let orderings = [
        Some(natural_order(4)),
        None, // amd
        Some(
            QDLDLSettingsBuilder::default()
                .perm(vec![3, 0, 2, 1])
                .build()
                .unwrap(),
        ),
    ];

    for opts in orderings {
        let mut factors = QDLDLFactorisation::new(&A, opts).unwrap();
        let mut b = [20.0, -22.0, 32.0, -7.0];
        factors.solve(&mut b);
        assert!(x.norm_inf_diff(&b) <= 1e-8);
        assert_eq!(factors.positive_inertia(), 4);
    }
}

#[test]
fn test_update_values_and_refactor() {
    let A = test_matrix_quasidef();
    let opts = QDLDLSettingsBuilder::default()
        .Dsigns(vec![1, -1])
        .build()
        .unwrap();
    let mut factors = QDLDLFactorisation::new(&A, Some(opts)).unwrap();
    assert_eq!(factors.positive_inertia(), 1);
    assert_eq!(factors.regularize_count(), 0);

    // A[1,1] = -1 -> -3
    factors.update_values(&[2], &[-3.]);
    factors.refactor().unwrap();
    let mut b = [2., -2.];
    factors.solve(&mut b);
    assert!(b.norm_inf_diff(&[1., 1.]) <= 1e-12);

    // and back again by offsetting
    factors.offset_values(&[2], 2., &[1]);
    factors.refactor().unwrap();
    let mut b = [2., 0.];
    factors.solve(&mut b);
    assert!(b.norm_inf_diff(&[1., 1.]) <= 1e-12);
}

#[test]
fn test_dynamic_regularization() {
    let A = CscMatrix::new(2, 2, vec![0, 1, 2], vec![0, 1], vec![1e-14, 1.]);
    let factors = QDLDLFactorisation::new(&A, Some(natural_order(2))).unwrap();
    assert_eq!(factors.regularize_count(), 1);
    assert_eq!(factors.D, vec![1e-7, 1.]);
}

#[test]
fn test_bad_numeric_pivot() {
    //Disable regularization to force an exact zero pivot
    let opts = QDLDLSettingsBuilder::default()
        .regularize_enable(false)
        .build()
        .unwrap();

    //set the first element of A to zero (top left)
    let mut A = test_matrix_4x4();
    A.nzval[0] = 0.;
    let err = QDLDLFactorisation::new(&A, Some(opts.clone())).unwrap_err();
    assert_eq!(err, QDLDLError::ZeroPivot);

    //set the final element of A to zero (bottom right)
    let mut A = test_matrix_4x4();
    *A.nzval.last_mut().unwrap() = 0.;
    assert!(QDLDLFactorisation::new(&A, Some(opts)).is_err());
}

#[test]
fn test_structure_errors() {
    let A = CscMatrix::from(&[
        //
        [1.0, 3.0, 5.0],
        [2.0, 3.0, 6.0],
        [1.0, 4.0, 7.0],
    ]);
    let err = QDLDLFactorisation::new(&A, None).unwrap_err();
    assert_eq!(err, QDLDLError::NotUpperTriangular);

    // second column is empty
    let A = CscMatrix::from(&[
        //
        [1.0, 0.0, 5.0],
        [0.0, 0.0, 6.0],
        [0.0, 0.0, 7.0],
    ]);
    let err = QDLDLFactorisation::new(&A, None).unwrap_err();
    assert_eq!(err, QDLDLError::EmptyColumn);

    let A = CscMatrix::<f64>::from(&[[1.0, 2.0, 3.0]]);
    let err = QDLDLFactorisation::new(&A, None).unwrap_err();
    assert_eq!(err, QDLDLError::IncompatibleDimension);
}

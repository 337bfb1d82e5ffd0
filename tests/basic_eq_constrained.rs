#![allow(non_snake_case)]
#[cfg(target_family = "wasm")]
use wasm_bindgen_test::*;

use dasqp::{algebra::*, solver::*};

fn settings_with(mode: SolverMode, backend: &str) -> DefaultSettings<f64> {
    DefaultSettingsBuilder::default()
        .mode(mode)
        .kkt_backend(backend.to_string())
        .build()
        .unwrap()
}

#[test]
fn test_eq_constrained_feasible() {
    // minimize 0.5|x|^2  s.t. x1 + x2 + x3 = 3,  x1 - x2 = 0
    let H = CscMatrix::identity(3);
    let q = [0., 0., 0.];
    let A = CscMatrix::from(&[
        [1., 1., 1.],  //
        [1., -1., 0.], //
    ]);
    let a = [3., 0.];
    let B = CscMatrix::zeros((0, 3));
    let b = [];

    for backend in ["qdldl", "dense"] {
        let settings = settings_with(SolverMode::Fixed, backend);
        let mut solver = DefaultSolver::new(&H, &q, &A, &a, &B, &b, settings).unwrap();
        let status = solver.solve();

        assert_eq!(status, SolverStatus::Optimal);
        assert!(solver.solution.x.norm_inf_diff(&[1., 1., 1.]) <= 1e-7);
        assert!(solver.solution.y.norm_inf_diff(&[-1., 0.]) <= 1e-7);
        assert!(solver.info.cons_sat <= 1e-7);
    }
}

#[test]
fn test_eq_constrained_with_inequality() {
    // minimize 0.5|x|^2  s.t. x1 + x2 + x3 = 3,  x1 >= 2
    let H = CscMatrix::identity(3);
    let q = [0., 0., 0.];
    let A = CscMatrix::from(&[[1., 1., 1.]]);
    let a = [3.];
    let B = CscMatrix::from(&[[-1., 0., 0.]]);
    let b = [-2.];

    let settings: DefaultSettings<f64> = DefaultSettings::default();
    let mut solver = DefaultSolver::new(&H, &q, &A, &a, &B, &b, settings).unwrap();
    let status = solver.solve();

    assert_eq!(status, SolverStatus::Optimal);
    assert!(solver.solution.x.norm_inf_diff(&[2., 0.5, 0.5]) <= 1e-8);
    assert!((solver.solution.y[0] + 0.5).abs() <= 1e-8);
    assert!((solver.solution.lambda[0] - 1.5).abs() <= 1e-8);
}

fn inconsistent_data() -> (CscMatrix<f64>, [f64; 2], CscMatrix<f64>, [f64; 2]) {
    let H = CscMatrix::identity(2);
    let q = [0., 0.];
    // x1 + x2 = 1 and x1 + x2 = 2
    let A = CscMatrix::from(&[
        [1., 1.], //
        [1., 1.], //
    ]);
    let a = [1., 2.];
    (H, q, A, a)
}

#[test]
fn test_eq_constrained_inconsistent_sparse() {
    let (H, q, A, a) = inconsistent_data();
    let B = CscMatrix::zeros((0, 2));

    let settings = settings_with(SolverMode::Fixed, "qdldl");
    let mut solver = DefaultSolver::new(&H, &q, &A, &a, &B, &[], settings).unwrap();

    let result = solver.initialize();
    assert!(matches!(
        result,
        Err(SolverError::InconsistentEqualities { .. }) | Err(SolverError::Kkt(_))
    ));
}

#[test]
fn test_eq_constrained_dependent_dense() {
    let (H, q, A, a) = inconsistent_data();
    let B = CscMatrix::zeros((0, 2));

    let settings = settings_with(SolverMode::Fixed, "dense");
    let mut solver = DefaultSolver::new(&H, &q, &A, &a, &B, &[], settings).unwrap();

    let result = solver.initialize();
    assert!(matches!(
        result,
        Err(SolverError::Kkt(KKTError::DependentEquality(1)))
    ));

    // stepping reports the failure through the status
    let status = solver.step();
    assert_eq!(status, SolverStatus::Infeasible);
    assert!(solver.info.last_diagnostic().is_some());
}

#[test]
fn test_eq_constrained_inconsistent_tuned() {
    let (H, q, A, a) = inconsistent_data();
    let B = CscMatrix::zeros((0, 2));

    // the tuned variant starts from the regularized point anyway
    let settings = settings_with(SolverMode::Tuned, "qdldl");
    let mut solver = DefaultSolver::new(&H, &q, &A, &a, &B, &[], settings).unwrap();

    assert!(solver.initialize().is_ok());
    let status = solver.solve();
    assert!(status.is_terminal());
    assert_ne!(status, SolverStatus::Optimal);
    assert!(!(solver.info.cons_sat <= 1e-3));
}

#[cfg(target_family = "wasm")]
#[wasm_bindgen_test]
fn test_eq_constrained_feasible_wasm() {
    wasm_bindgen_test_configure!(run_in_browser);
    test_eq_constrained_feasible();
}

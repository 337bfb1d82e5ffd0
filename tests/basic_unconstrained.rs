#![allow(non_snake_case)]
#[cfg(target_family = "wasm")]
use wasm_bindgen_test::*;

use dasqp::{algebra::*, solver::*};

#[test]
fn test_unconstrained_feasible() {
    let H = CscMatrix::from(&[
        [2., 0.], //
        [0., 2.], //
    ]);
    let q = [-2., -4.];
    let A = CscMatrix::zeros((0, 2)); // <- no constraints
    let a = [];
    let B = CscMatrix::zeros((0, 2));
    let b = [];

    let settings: DefaultSettings<f64> = DefaultSettings::default();
    let mut solver = DefaultSolver::new(&H, &q, &A, &a, &B, &b, settings).unwrap();

    let status = solver.step();
    assert_eq!(status, SolverStatus::Optimal);
    assert_eq!(solver.solution.iterations, 0);
    assert_eq!(solver.info.action, StepAction::Converged);

    let refsol = [1., 2.];
    assert!(solver.solution.x.norm_inf_diff(&refsol) <= 1e-8);
    assert!((solver.solution.obj_val + 5.).abs() <= 1e-8);
    assert!(solver.solution.active.is_empty());
}

#[test]
fn test_unconstrained_infinite_rows() {
    // rows with infinite bounds never enter the active set
    let H = CscMatrix::identity(3);
    let q = [1., 2., -3.];
    let A = CscMatrix::zeros((0, 3));
    let a = [];
    let B = CscMatrix::from(&[
        [1., 0., 0.], //
        [0., 0., 1.], //
    ]);
    let b = [f64::INFINITY, get_infinity()];

    let settings: DefaultSettings<f64> = DefaultSettings::default();
    let mut solver = DefaultSolver::new(&H, &q, &A, &a, &B, &b, settings).unwrap();
    let status = solver.solve();

    assert_eq!(status, SolverStatus::Optimal);
    assert!(solver.solution.x.norm_inf_diff(&[-1., -2., 3.]) <= 1e-8);
    assert_eq!(solver.info.num_violated, 0);
    assert_eq!(solver.solution.lambda, vec![0., 0.]);
}

#[test]
fn test_unconstrained_both_backends() {
    let H = CscMatrix::identity(3);
    let q = [1., 2., -3.];
    let A = CscMatrix::zeros((0, 3));
    let B = CscMatrix::zeros((0, 3));

    for backend in ["qdldl", "dense"] {
        let settings = DefaultSettingsBuilder::default()
            .kkt_backend(backend.to_string())
            .build()
            .unwrap();
        let mut solver = DefaultSolver::new(&H, &q, &A, &[], &B, &[], settings).unwrap();
        assert_eq!(solver.solve(), SolverStatus::Optimal);
        assert!(solver.solution.x.norm_inf_diff(&[-1., -2., 3.]) <= 1e-7);
    }
}

#[cfg(target_family = "wasm")]
#[wasm_bindgen_test]
fn test_unconstrained_feasible_wasm() {
    wasm_bindgen_test_configure!(run_in_browser);
    test_unconstrained_feasible();
}

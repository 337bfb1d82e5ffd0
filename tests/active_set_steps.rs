#![allow(non_snake_case)]
#[cfg(target_family = "wasm")]
use wasm_bindgen_test::*;

use dasqp::{algebra::*, solver::*};

// minimize 0.5x^2 - 2x  s.t. 4x <= 6,  x <= 0.5
//
// The most violated row enters first.  Once the second row is selected
// the primal direction vanishes and the first row leaves through a dual
// only step before the second row is added.
fn degenerate_solver(settings: DefaultSettings<f64>) -> DefaultSolver<f64> {
    let H = CscMatrix::identity(1);
    let q = [-2.];
    let A = CscMatrix::zeros((0, 1));
    let B = CscMatrix::from(&[
        [4.], //
        [1.], //
    ]);
    let b = [6., 0.5];
    DefaultSolver::new(&H, &q, &A, &[], &B, &b, settings).unwrap()
}

fn dense_settings() -> DefaultSettings<f64> {
    DefaultSettingsBuilder::default()
        .kkt_backend("dense".to_string())
        .build()
        .unwrap()
}

#[test]
fn test_add_then_dual_only_drop() {
    let mut solver = degenerate_solver(dense_settings());
    solver.initialize().unwrap();
    assert!((solver.variables.x[0] - 2.).abs() < 1e-7);

    // step 1: row 0 is the most violated and enters
    assert_eq!(solver.step(), SolverStatus::NotFinished);
    assert_eq!(solver.info.action, StepAction::Add(0));
    assert_eq!(solver.info.num_violated, 2);
    assert!((solver.info.primal_step.unwrap() - 0.125).abs() < 1e-7);
    assert!((solver.variables.x[0] - 1.5).abs() < 1e-7);
    assert!((solver.variables.lambda[0] - 0.125).abs() < 1e-7);
    assert_eq!(solver.info.n_active, 1);

    // step 2: row 1 is selected, x cannot move, row 0 leaves
    assert_eq!(solver.step(), SolverStatus::NotFinished);
    assert_eq!(solver.info.action, StepAction::DualOnlyDrop(0));
    assert_eq!(solver.info.primal_step, None);
    assert!((solver.info.dual_step.unwrap() - 0.5).abs() < 1e-7);
    assert!((solver.variables.x[0] - 1.5).abs() < 1e-7);
    assert_eq!(solver.variables.lambda[0], 0.);
    assert!((solver.variables.lambda[1] - 0.5).abs() < 1e-7);
    assert_eq!(solver.info.n_active, 0);

    // step 3: the same candidate is added without a new selection
    assert_eq!(solver.step(), SolverStatus::NotFinished);
    assert_eq!(solver.info.action, StepAction::Add(1));
    assert!((solver.variables.x[0] - 0.5).abs() < 1e-7);
    assert!((solver.variables.lambda[1] - 1.5).abs() < 1e-7);

    // step 4: nothing is violated
    assert_eq!(solver.step(), SolverStatus::Optimal);
    assert_eq!(solver.solution.iterations, 3);
    assert_eq!(solver.solution.active, vec![1]);
    assert!(solver.solution.lambda.norm_inf_diff(&[0., 1.5]) < 1e-7);
    assert!((solver.solution.obj_val + 0.875).abs() < 1e-7);
}

#[test]
fn test_degenerate_sparse_backend() {
    let mut solver = degenerate_solver(DefaultSettings::default());
    assert_eq!(solver.solve(), SolverStatus::Optimal);
    assert!((solver.solution.x[0] - 0.5).abs() < 1e-8);
    assert!((solver.solution.lambda[1] - 1.5).abs() < 1e-8);
}

#[test]
fn test_iteration_limit() {
    let settings = DefaultSettingsBuilder::default()
        .kkt_backend("dense".to_string())
        .max_iter(1)
        .build()
        .unwrap();
    let mut solver = degenerate_solver(settings);

    assert_eq!(solver.steps(2), SolverStatus::Infeasible);
    assert_eq!(solver.info.action, StepAction::Failed);

    // the objective of the last iterate is still reported
    assert!((solver.solution.x[0] - 1.5).abs() < 1e-7);
    assert!((solver.solution.obj_val + 1.875).abs() < 1e-7);
}

#[test]
fn test_termination_bound() {
    // steps(max_iter + 1) always ends the iteration
    for mode in [SolverMode::Fixed, SolverMode::Tuned, SolverMode::Auto] {
        for backend in ["qdldl", "dense"] {
            for max_iter in 0..5 {
                let settings = DefaultSettingsBuilder::default()
                    .mode(mode)
                    .kkt_backend(backend.to_string())
                    .max_iter(max_iter)
                    .build()
                    .unwrap();
                let mut solver = degenerate_solver(settings);
                let status = solver.steps(max_iter + 1);
                assert!(status.is_terminal(), "{mode} / {backend} / {max_iter}");
            }
        }
    }
}

#[test]
fn test_steps_stop_early() {
    let mut solver = degenerate_solver(dense_settings());
    assert_eq!(solver.steps(0), SolverStatus::NotFinished);

    // steps stops at the first terminal status
    assert_eq!(solver.steps(100), SolverStatus::Optimal);
    assert_eq!(solver.solution.iterations, 3);
}

// minimize 0.5|x|^2 - x1 - x2  s.t. x1 + x2 <= 1
fn single_cut_solver(settings: DefaultSettings<f64>) -> DefaultSolver<f64> {
    let H = CscMatrix::identity(2);
    let q = [-1., -1.];
    let A = CscMatrix::zeros((0, 2));
    let B = CscMatrix::from(&[[1., 1.]]);
    let b = [1.];
    DefaultSolver::new(&H, &q, &A, &[], &B, &b, settings).unwrap()
}

fn step_trace(solver: &mut DefaultSolver<f64>) -> Vec<(SolverStatus, StepAction)> {
    let mut trace = vec![];
    for _ in 0..20 {
        let status = solver.step();
        trace.push((status, solver.info.action));
        if status.is_terminal() {
            break;
        }
    }
    trace
}

#[test]
fn test_tuned_retry_rounds() {
    use SolverStatus::*;

    let settings = DefaultSettingsBuilder::default()
        .mode(SolverMode::Tuned)
        .build()
        .unwrap();
    assert_eq!(settings.tuned_rounds, 4);
    let mut solver = single_cut_solver(settings);

    // every finish is followed by a restart until the rounds run out
    let trace = step_trace(&mut solver);
    let mut expected = vec![(NotFinished, StepAction::Add(0))];
    expected.extend([(NotFinished, StepAction::Converged); 4]);
    expected.push((Optimal, StepAction::Converged));
    assert_eq!(trace, expected);
    assert_eq!(solver.state.retries, 4);

    assert!(solver.solution.x.norm_inf_diff(&[0.5, 0.5]) < 1e-8);
    assert!(solver.solution.lambda.norm_inf_diff(&[0.5]) < 1e-8);

    // the result is stable once terminal
    assert_eq!(solver.step(), Optimal);
    assert_eq!(solver.state.retries, 4);
}

#[test]
fn test_fixed_never_retries() {
    let mut solver = single_cut_solver(DefaultSettings::default());

    let trace = step_trace(&mut solver);
    assert_eq!(
        trace,
        vec![
            (SolverStatus::NotFinished, StepAction::Add(0)),
            (SolverStatus::Optimal, StepAction::Converged),
        ]
    );
    assert_eq!(solver.state.retries, 0);
}

#[test]
fn test_tuned_retry_needs_budget() {
    // max_iter = 1: the budget is spent by the add, so no restart happens
    let settings = DefaultSettingsBuilder::default()
        .mode(SolverMode::Tuned)
        .max_iter(1)
        .build()
        .unwrap();
    let mut solver = single_cut_solver(settings);

    assert_eq!(solver.step(), SolverStatus::NotFinished);
    assert_eq!(solver.step(), SolverStatus::Infeasible);
    assert_eq!(solver.info.action, StepAction::Failed);
    assert_eq!(solver.state.retries, 0);

    // max_iter = 2: one restart consumes the last iteration
    let settings = DefaultSettingsBuilder::default()
        .mode(SolverMode::Tuned)
        .max_iter(2)
        .build()
        .unwrap();
    let mut solver = single_cut_solver(settings);

    let trace = step_trace(&mut solver);
    assert_eq!(trace.len(), 3);
    assert_eq!(trace[1], (SolverStatus::NotFinished, StepAction::Converged));
    assert_eq!(trace[2], (SolverStatus::Infeasible, StepAction::Failed));
    assert_eq!(solver.state.retries, 1);
}

#[test]
fn test_infeasible_inequalities() {
    // x >= 1 and x <= 0 can't both hold
    let H = CscMatrix::identity(1);
    let q = [0.];
    let A = CscMatrix::zeros((0, 1));
    let B = CscMatrix::from(&[
        [-1.], //
        [1.],  //
    ]);
    let b = [-1., 0.];

    let mut solver = DefaultSolver::new(&H, &q, &A, &[], &B, &b, dense_settings()).unwrap();
    let status = solver.solve();

    // the second row has no primal direction and nothing can leave
    assert_eq!(status, SolverStatus::Infeasible);
    assert_eq!(solver.solution.active, vec![0]);
}

#[cfg(target_family = "wasm")]
#[wasm_bindgen_test]
fn test_add_then_dual_only_drop_wasm() {
    wasm_bindgen_test_configure!(run_in_browser);
    test_add_then_dual_only_drop();
}

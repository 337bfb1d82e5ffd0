use self::internal::*;
use super::kktsolvers::{ActiveSetEdit, KKTError, SolveType};
use super::traits::*;
use super::{ActiveSet, SettingsError, SolveStrategy, SupportedStrategy};
use crate::algebra::*;
use crate::timers::*;
use thiserror::Error;

// ---------------------------------
// Solver status type
// ---------------------------------

/// Status of the solver after a step

#[repr(u32)]
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverStatus {
    /// More steps are needed.   Never a final result.
    #[default]
    NotFinished,
    /// The iteration stopped without reaching a feasible point
    /// within tolerance.
    NotConverged,
    /// Solver terminated with a solution.
    Optimal,
    /// Solution is feasible but the optimality conditions
    /// hold only to reduced accuracy.
    Inaccurate,
    /// The iteration failed: no step was possible, no candidate
    /// could be found, or the iteration limit was reached.
    Infeasible,
}

impl SolverStatus {
    /// true for every status other than `NotFinished`
    pub fn is_terminal(&self) -> bool {
        !matches!(*self, SolverStatus::NotFinished)
    }
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error type returned by solver construction and initialization.

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("bad problem data: {0}")]
    BadInput(&'static str),
    #[error("bad sparse matrix format: {0}")]
    SparseFormat(#[from] SparseFormatError),
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("KKT system failure: {0}")]
    Kkt(#[from] KKTError),
    #[error("equality constraints are inconsistent (residual {residual:e})")]
    InconsistentEqualities { residual: f64 },
}

/// Iteration state of the active set method, carried between steps.

#[derive(Debug, Clone)]
pub struct StepState {
    /// inequality row selected to enter the active set
    pub nxt_active: Option<usize>,
    /// active row selected by the dual ratio test
    pub nxt_drop: Option<usize>,
    /// true when the next step starts with candidate selection
    pub to_add: bool,
    pub num_violated: usize,
    /// treatment of the factorization in the next solve
    pub typ_nxt_solve: SolveType,
    pub num_iter: u32,
    pub is_converged: bool,
    pub finished: bool,
    /// restarts consumed so far
    pub retries: u32,
    pub initialized: bool,
}

impl Default for StepState {
    fn default() -> Self {
        Self {
            nxt_active: None,
            nxt_drop: None,
            to_add: true,
            num_violated: 0,
            typ_nxt_solve: SolveType::Solve,
            num_iter: 0,
            is_converged: false,
            finished: false,
            retries: 0,
            initialized: false,
        }
    }
}

impl StepState {
    fn finish(&mut self, converged: bool) {
        self.finished = true;
        self.is_converged = converged;
    }
}

// ---------------------------------
// top level solver container type
// ---------------------------------

// The top-level solver.

// This type is defined with a collection of mutually interacting associated types.
// See the [`DefaultSolver`](crate::solver::implementations::default) for an example.

pub struct Solver<D, V, R, K, I, SO, SE> {
    pub data: D,
    pub variables: V,
    pub residuals: R,
    pub kktsystem: K,
    pub active: ActiveSet,
    pub state: StepState,
    pub info: I,
    pub solution: SO,
    pub settings: SE,
    pub strategy: SupportedStrategy,
    pub timers: Option<Timers>,
    // rows supplied by a warm start, used by the next initialize
    pub(crate) warm_rows: Vec<usize>,
}

// ---------------------------------
// ActiveSetSolver trait and its standard implementation.
// ---------------------------------

/// A dual active set solver.
///
/// The iteration can be driven one step at a time with
/// [`step`](ActiveSetSolver::step), in batches with
/// [`steps`](ActiveSetSolver::steps), or to completion with
/// [`solve`](ActiveSetSolver::solve).

pub trait ActiveSetSolver<T: FloatT> {
    /// Scale the data, factor the KKT system and compute the
    /// starting point.   Resets the iteration state.
    fn initialize(&mut self) -> Result<(), SolverError>;

    /// Perform one iteration.  Returns `NotFinished` until a
    /// terminal status is reached.
    fn step(&mut self) -> SolverStatus;

    /// Perform up to `n` iterations, stopping at the first
    /// terminal status.
    fn steps(&mut self, n: u32) -> SolverStatus;

    /// Initialize if needed and step until a terminal status.
    fn solve(&mut self) -> SolverStatus;

    /// Seed the active set of the next initialization with the given
    /// inequality rows.  Rows that are out of range, have an infinite
    /// bound, are repeated or carry a negative multiplier are ignored.
    fn warm_start(&mut self, active: &[usize], lambda: &[T]) -> Result<(), SolverError>;
}

impl<T, D, V, R, K, I, SO, SE> ActiveSetSolver<T> for Solver<D, V, R, K, I, SO, SE>
where
    T: FloatT,
    D: ProblemData<T, V = V, SE = SE>,
    V: Variables<T, D = D, SE = SE>,
    R: Residuals<T, D = D, V = V>,
    K: KKTSystem<T, D = D, V = V, SE = SE>,
    I: Info<T, D = D, V = V, R = R, SE = SE>,
    SO: Solution<T, D = D, V = V, I = I>,
    SE: Settings<T>,
{
    fn initialize(&mut self) -> Result<(), SolverError> {
        //timers is stored as an option so that
        //we can swap it out here and avoid
        //borrow conflicts with other fields.
        let mut timers = self.timers.take().unwrap_or_default();
        let result = self.initialize_timed(&mut timers);
        self.timers.replace(timers);
        result
    }

    fn step(&mut self) -> SolverStatus {
        let mut timers = self.timers.take().unwrap_or_default();

        if !self.state.initialized {
            if let Err(e) = self.initialize_timed(&mut timers) {
                self.info.record_diagnostic(&e.to_string());
                self.state.initialized = true;
                self.state.finish(false);
            }
        }

        let status = self.info.get_status();
        if status.is_terminal() {
            self.timers.replace(timers);
            return status;
        }

        if !self.state.finished {
            timeit! {timers => "step"; {
                self.solve_step(&mut timers);
            }}
        }

        let status;
        timeit! {timers => "classify"; {
            status = self.check_step_status(&mut timers);
        }}

        if status.is_terminal() {
            self.info.finalize(&self.residuals, &mut timers);
            self.solution
                .finalize(&self.data, &self.variables, &self.info, &self.active);
            notimeit! {timers; {
                let _ = self.info.print_footer(&self.settings);
            }}
        }

        //stow the timers back into Option in the solver struct
        self.timers.replace(timers);
        status
    }

    fn steps(&mut self, n: u32) -> SolverStatus {
        let mut status = SolverStatus::NotFinished;
        for _ in 0..n {
            status = self.step();
            if status.is_terminal() {
                break;
            }
        }
        status
    }

    fn solve(&mut self) -> SolverStatus {
        loop {
            let status = self.step();
            if status.is_terminal() {
                return status;
            }
        }
    }

    fn warm_start(&mut self, active: &[usize], lambda: &[T]) -> Result<(), SolverError> {
        if active.len() != lambda.len() {
            return Err(SolverError::BadInput(
                "warm start rows and multipliers differ in length",
            ));
        }
        let mi = self.active.capacity();
        let mut seen = vec![false; mi];
        self.warm_rows.clear();

        for (&i, &l) in std::iter::zip(active, lambda) {
            if i >= mi || seen[i] || !self.data.is_finite_row(i) || !(l >= T::zero()) {
                continue;
            }
            seen[i] = true;
            self.warm_rows.push(i);
        }
        self.state.initialized = false;
        Ok(())
    }
}

// Encapsulate the internal helpers trait in a private module
// so it doesn't get exported
mod internal {
    use super::super::steplength::*;
    use super::super::traits::*;
    use super::super::RegularizationPolicy;
    use super::*;

    pub(super) trait ActiveSetSolverInternals<T: FloatT> {
        /// initialization with the timers already taken out
        fn initialize_timed(&mut self, timers: &mut Timers) -> Result<(), SolverError>;

        /// Scale, build the KKT backend and compute the starting point
        fn prepare_start(&mut self) -> Result<(), SolverError>;

        /// Solve for the starting point on the current active set,
        /// removing rows with negative multipliers until none remain
        fn solve_restricted_start(&mut self, reg: &RegularizationPolicy<T>)
            -> Result<(), KKTError>;

        /// One transition of the active set method
        fn solve_step(&mut self, timers: &mut Timers);

        /// Apply an edit to the factorization and the active set
        fn commit_edit(&mut self, edit: ActiveSetEdit) -> bool;

        /// Restart, retry or classify once the transition is made
        fn check_step_status(&mut self, timers: &mut Timers) -> SolverStatus;

        /// Warm restart with smaller regularization
        fn restart_round(&mut self) -> Result<(), KKTError>;

        fn diagnostic(&mut self, timers: &mut Timers, msg: &str);
    }

    impl<T, D, V, R, K, I, SO, SE> ActiveSetSolverInternals<T> for Solver<D, V, R, K, I, SO, SE>
    where
        T: FloatT,
        D: ProblemData<T, V = V, SE = SE>,
        V: Variables<T, D = D, SE = SE>,
        R: Residuals<T, D = D, V = V>,
        K: KKTSystem<T, D = D, V = V, SE = SE>,
        I: Info<T, D = D, V = V, R = R, SE = SE>,
        SO: Solution<T, D = D, V = V, I = I>,
        SE: Settings<T>,
    {
        fn initialize_timed(&mut self, timers: &mut Timers) -> Result<(), SolverError> {
            self.info.reset(timers);

            // scaling is applied once per initialization
            if self.data.is_scaled() {
                self.data.unscale(&mut self.variables);
            }

            notimeit! {timers; {
                let _ = self.info.print_configuration(&self.settings, &self.data);
                let _ = self.info.print_status_header(&self.settings);
            }}

            self.state = StepState::default();

            let started;
            timeit! {timers => "initialize"; {
                started = self.prepare_start();
            }}
            started?;

            if self.strategy.strict_initialization() {
                let residual = self.data.equality_residual(&self.variables);
                if !(residual <= self.settings.core().eps_abs) {
                    return Err(SolverError::InconsistentEqualities {
                        residual: residual.to_f64().unwrap_or(f64::INFINITY),
                    });
                }
            }

            self.state.initialized = true;
            Ok(())
        }

        fn prepare_start(&mut self) -> Result<(), SolverError> {
            self.data.scale(&self.settings);

            let reg = self
                .strategy
                .regularization(self.settings.core().static_regularization_constant, 0);
            self.kktsystem.initialize(&self.data, &self.settings, &reg)?;
            self.info.record_backend(self.kktsystem.backend_name());

            self.active.clear();
            for &i in self.warm_rows.iter() {
                self.active.apply(ActiveSetEdit::Add(i));
            }
            self.variables.reset();
            self.solve_restricted_start(&reg)?;

            if !self.warm_rows.is_empty() {
                self.state.typ_nxt_solve = SolveType::Refactor;
            }
            Ok(())
        }

        fn solve_restricted_start(
            &mut self,
            reg: &RegularizationPolicy<T>,
        ) -> Result<(), KKTError> {
            loop {
                self.kktsystem.solve_initial_point(
                    &mut self.variables,
                    &self.data,
                    &self.active,
                    &self.settings,
                    reg,
                )?;
                let negative = self.variables.negative_duals(&self.active);
                if negative.is_empty() {
                    return Ok(());
                }
                for j in negative {
                    let dropped = self.active.apply(ActiveSetEdit::Drop(j));
                    assert!(dropped, "negative multiplier on an inactive row");
                    self.variables.zero_dual(j);
                }
            }
        }

        fn solve_step(&mut self, timers: &mut Timers) {
            let settings = self.settings.core();
            let mut record = StepRecord {
                iteration: self.state.num_iter,
                num_violated: self.state.num_violated,
                primal_step: None,
                dual_step: None,
                action: StepAction::None,
            };

            // hard bound on the number of iterations
            if self.state.num_iter >= settings.max_iter {
                self.state.finish(false);
                record.action = StepAction::Failed;
                self.info.save_step(record, &self.active);
                return;
            }

            if self.state.to_add {
                let (num_violated, candidate) =
                    self.variables
                        .primal_feasibility(&self.data, &self.active, &self.settings);
                self.state.num_violated = num_violated;
                self.state.nxt_active = candidate;
                record.num_violated = num_violated;

                if num_violated == 0 {
                    self.state.finish(true);
                    record.action = StepAction::Converged;
                    self.info.save_step(record, &self.active);
                    return;
                }
                match candidate {
                    Some(p) => self.kktsystem.update_rhs(&self.data, p),
                    None => {
                        self.diagnostic(timers, "All constraints are used");
                        self.state.finish(false);
                        record.action = StepAction::Failed;
                        self.info.save_step(record, &self.active);
                        return;
                    }
                }
            }

            let Some(p) = self.state.nxt_active else {
                self.state.finish(false);
                record.action = StepAction::Failed;
                self.info.save_step(record, &self.active);
                return;
            };

            if let Err(e) = self.kktsystem.solve(
                &mut self.variables,
                self.state.typ_nxt_solve,
                &self.active,
                &self.settings,
            ) {
                self.diagnostic(timers, &e.to_string());
                self.state.finish(false);
                record.action = StepAction::Failed;
                self.info.save_step(record, &self.active);
                return;
            }

            // ratio tests
            let step_tolerance = self.settings.core().step_tolerance;
            let primal = primal_step_length(
                self.variables.candidate_violation(&self.data, p),
                self.variables.candidate_slope(&self.data, p),
                step_tolerance,
            );
            let dual = self.variables.dual_step_length(&self.active, &self.settings);
            self.state.nxt_drop = dual.drop;
            record.primal_step = primal.value();
            record.dual_step = dual.length.value();

            let committed = commit_step(primal, dual);
            match committed {
                CommittedStep::Unbounded => {
                    self.state.finish(false);
                    record.action = StepAction::Failed;
                }
                CommittedStep::DualOnly { length, drop } => {
                    self.variables.update_dual(length, &self.active);
                    self.variables.add_activation_dual(p, length);
                    self.state.to_add = false;
                    if self.commit_edit(ActiveSetEdit::Drop(drop)) {
                        record.action = StepAction::DualOnlyDrop(drop);
                    } else {
                        record.action = StepAction::Failed;
                    }
                }
                CommittedStep::Add { length } | CommittedStep::Drop { length, .. } => {
                    self.variables.update_primal(length);
                    self.variables.update_dual(length, &self.active);
                    self.variables.add_activation_dual(p, length);

                    let edit = match committed {
                        CommittedStep::Drop { drop, .. } => ActiveSetEdit::Drop(drop),
                        _ => ActiveSetEdit::Add(p),
                    };
                    self.state.to_add = matches!(edit, ActiveSetEdit::Add(_));

                    record.action = match (self.commit_edit(edit), edit) {
                        (true, ActiveSetEdit::Add(i)) => StepAction::Add(i),
                        (true, ActiveSetEdit::Drop(i)) => StepAction::Drop(i),
                        (false, _) => StepAction::Failed,
                    };
                    assert_eq!(
                        self.active.n_active(),
                        self.active.len(),
                        "active count diverged from the active set"
                    );
                }
            }

            self.info.save_step(record, &self.active);
        }

        fn commit_edit(&mut self, edit: ActiveSetEdit) -> bool {
            if let Err(e) = self.kktsystem.edit(edit) {
                self.info.record_diagnostic(&e.to_string());
                self.state.finish(false);
                return false;
            }
            let applied = self.active.apply(edit);
            assert!(applied, "active set rejected {:?}", edit);

            if let ActiveSetEdit::Drop(j) = edit {
                self.variables.zero_dual(j);
            }
            self.state.typ_nxt_solve = SolveType::Update;
            true
        }

        fn check_step_status(&mut self, timers: &mut Timers) -> SolverStatus {
            if !self.state.finished {
                self.state.num_iter += 1;
                self.info.set_status(SolverStatus::NotFinished);
                notimeit! {timers; {
                    let _ = self.info.print_status(&self.settings);
                }}
                return SolverStatus::NotFinished;
            }

            notimeit! {timers; {
                let _ = self.info.print_status(&self.settings);
            }}

            // a restart counts against the iteration budget
            let budget_left = self.state.num_iter < self.settings.core().max_iter;
            if budget_left && self.strategy.allows_retry(self.state.retries) {
                self.state.retries += 1;
                match self.restart_round() {
                    Ok(()) => {
                        self.state.num_iter += 1;
                        let msg = format!(
                            "restart {} with smaller regularization",
                            self.state.retries
                        );
                        notimeit! {timers; {
                            let _ = self.info.print_message(&self.settings, &msg);
                        }}
                        return SolverStatus::NotFinished;
                    }
                    Err(e) => self.diagnostic(timers, &e.to_string()),
                }
            }

            // final classification on the original data
            self.data.unscale(&mut self.variables);
            self.residuals.update(&self.variables, &self.data);
            let status = self
                .info
                .classify(self.state.is_converged, &self.residuals, &self.settings);
            self.info.set_status(status);
            status
        }

        fn restart_round(&mut self) -> Result<(), KKTError> {
            let reg = self.strategy.regularization(
                self.settings.core().static_regularization_constant,
                self.state.retries,
            );
            self.solve_restricted_start(&reg)?;

            let state = &mut self.state;
            state.to_add = true;
            state.nxt_active = None;
            state.nxt_drop = None;
            state.typ_nxt_solve = SolveType::Refactor;
            state.finished = false;
            state.is_converged = false;
            Ok(())
        }

        fn diagnostic(&mut self, timers: &mut Timers, msg: &str) {
            self.info.record_diagnostic(msg);
            notimeit! {timers; {
                let _ = self.info.print_message(&self.settings, msg);
            }}
        }
    }
}

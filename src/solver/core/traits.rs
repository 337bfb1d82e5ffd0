//! Required traits for types providing an active set solver implementation.
//!
//! This module defines the core traits that must be implemented by a collection
//! of mutually associated data types to make a solver for a particular problem
//! format.
//!
//! In nearly all cases there is no need for a user to implement these traits.
//! Instead, users should use the collection of types that are provided
//! in the [Default solver implementation](crate::solver::implementations::default).

use super::kktsolvers::{ActiveSetEdit, KKTError, SolveType};
use super::{ActiveSet, CoreSettings, DualStep, RegularizationPolicy, SolverStatus};
use crate::algebra::*;
use crate::timers::*;

/// Data for a quadratic program.

pub trait ProblemData<T: FloatT> {
    type V: Variables<T>;
    type SE: Settings<T>;

    /// Scale internal data before the solver starts.   Does nothing
    /// if the data is already scaled.
    fn scale(&mut self, settings: &Self::SE);

    /// Restore the original data and map the variables back
    /// to the unscaled problem.   Does nothing if unscaled.
    fn unscale(&mut self, variables: &mut Self::V);

    fn is_scaled(&self) -> bool;

    /// true if inequality row `i` has a finite bound
    fn is_finite_row(&self, i: usize) -> bool;

    /// Violation of equality constraints `||Ax - a||_inf`
    fn equality_residual(&self, variables: &Self::V) -> T;
}

/// Primal and dual iterates together with the search directions.

pub trait Variables<T: FloatT> {
    type D: ProblemData<T>;
    type SE: Settings<T>;

    /// Zero the iterate and the directions
    fn reset(&mut self);

    /// Count the finite rows violated by more than the feasibility
    /// tolerance and pick the most violated inactive row, if any.
    fn primal_feasibility(
        &self,
        data: &Self::D,
        active: &ActiveSet,
        settings: &Self::SE,
    ) -> (usize, Option<usize>);

    /// `B_p x - b_p`
    fn candidate_violation(&self, data: &Self::D, p: usize) -> T;

    /// `B_p dx`, the rate of change of the candidate row
    fn candidate_slope(&self, data: &Self::D, p: usize) -> T;

    /// Ratio test over the active multipliers
    fn dual_step_length(&self, active: &ActiveSet, settings: &Self::SE) -> DualStep<T>;

    /// `x += t dx`
    fn update_primal(&mut self, t: T);

    /// `y += t dy` and `lambda_j += t dlambda_j` for active rows
    fn update_dual(&mut self, t: T, active: &ActiveSet);

    /// Multiplier gained by the candidate over a step of length `t`
    fn add_activation_dual(&mut self, p: usize, t: T);

    /// Set the multiplier of a dropped row to exactly zero
    fn zero_dual(&mut self, j: usize);

    /// Active rows with negative multipliers, in active set order
    fn negative_duals(&self, active: &ActiveSet) -> Vec<usize>;
}

/// Residuals for a quadratic program.

pub trait Residuals<T: FloatT> {
    type D: ProblemData<T>;
    type V: Variables<T>;

    /// Compute residuals for the given variables.
    fn update(&mut self, variables: &Self::V, data: &Self::D);
}

/// KKT linear solver object.

pub trait KKTSystem<T: FloatT> {
    type D: ProblemData<T>;
    type V: Variables<T>;
    type SE: Settings<T>;

    /// Build the linear system backend for the (scaled) problem data
    fn initialize(
        &mut self,
        data: &Self::D,
        settings: &Self::SE,
        reg: &RegularizationPolicy<T>,
    ) -> Result<(), KKTError>;

    /// Refactor for the given working set and solve
    /// `K [x; y; lambda_W] = [-q; a; b_W]` for the starting point.
    fn solve_initial_point(
        &mut self,
        variables: &mut Self::V,
        data: &Self::D,
        active: &ActiveSet,
        settings: &Self::SE,
        reg: &RegularizationPolicy<T>,
    ) -> Result<(), KKTError>;

    /// Set the right hand side `[-B_p'; 0]` for candidate `p`.
    fn update_rhs(&mut self, data: &Self::D, p: usize);

    /// Solve for the directions `dx`, `dy` and `dlambda`.
    fn solve(
        &mut self,
        variables: &mut Self::V,
        mode: SolveType,
        active: &ActiveSet,
        settings: &Self::SE,
    ) -> Result<(), KKTError>;

    /// Add a row to or remove a row from the factorization
    fn edit(&mut self, edit: ActiveSetEdit) -> Result<(), KKTError>;

    fn backend_name(&self) -> &'static str;
}

/// Printing functions for the solver's Info

pub trait InfoPrint<T>
where
    T: FloatT,
{
    type D: ProblemData<T>;
    type SE: Settings<T>;

    /// Print the solver configuration, e.g. settings etc.
    /// This function is called once at the start of the solve.
    fn print_configuration(&mut self, settings: &Self::SE, data: &Self::D) -> std::io::Result<()>;

    /// Print a header to appear at the top of progress information.
    fn print_status_header(&mut self, settings: &Self::SE) -> std::io::Result<()>;

    /// Print solver progress information.   Called once per step.
    fn print_status(&mut self, settings: &Self::SE) -> std::io::Result<()>;

    /// Print a diagnostic message
    fn print_message(&mut self, settings: &Self::SE, msg: &str) -> std::io::Result<()>;

    /// Print solver final status and other exit information.   Called at
    /// solver termination.
    fn print_footer(&mut self, settings: &Self::SE) -> std::io::Result<()>;
}

/// Internal information for the solver to monitor progress and check for termination.

pub trait Info<T>: InfoPrint<T>
where
    T: FloatT,
{
    type V: Variables<T>;
    type R: Residuals<T>;

    /// Reset internal data, particularly solve timers.
    fn reset(&mut self, timers: &mut Timers);

    /// Record the outcome of one step
    fn save_step(&mut self, record: StepRecord<T>, active: &ActiveSet);

    /// Record a diagnostic.  Kept even when printing is off.
    fn record_diagnostic(&mut self, msg: &str);

    fn record_backend(&mut self, name: &'static str);

    /// Classify a finished solve from the residual norms.
    fn classify(&mut self, converged: bool, residuals: &Self::R, settings: &Self::SE)
        -> SolverStatus;

    /// Compute final values before solver termination
    fn finalize(&mut self, residuals: &Self::R, timers: &mut Timers);

    /// Report or update termination status
    fn get_status(&self) -> SolverStatus;
    fn set_status(&mut self, status: SolverStatus);
}

/// What one call to `step` did, for printing and bookkeeping

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRecord<T> {
    pub iteration: u32,
    pub num_violated: usize,
    pub primal_step: Option<T>,
    pub dual_step: Option<T>,
    pub action: StepAction,
}

/// Outcome of one step

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepAction {
    #[default]
    None,
    Add(usize),
    Drop(usize),
    DualOnlyDrop(usize),
    Converged,
    Failed,
}

impl std::fmt::Display for StepAction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StepAction::None => write!(f, "-"),
            StepAction::Add(i) => write!(f, "add {}", i),
            StepAction::Drop(i) => write!(f, "drop {}", i),
            StepAction::DualOnlyDrop(i) => write!(f, "drop {} (dual)", i),
            StepAction::Converged => write!(f, "done"),
            StepAction::Failed => write!(f, "stop"),
        }
    }
}

/// Solution for a quadratic program.

pub trait Solution<T: FloatT> {
    type D: ProblemData<T>;
    type V: Variables<T>;
    type I: Info<T>;

    /// Compute solution from the Variables at solver termination
    fn finalize(&mut self, data: &Self::D, variables: &Self::V, info: &Self::I, active: &ActiveSet);
}

/// Settings for a quadratic program.
///
/// Implementors of this trait can define any internal or problem
/// specific settings they wish.   They must, however, also maintain
/// a settings object of type [`CoreSettings`](crate::solver::core::CoreSettings)
/// and return this to the solver internally.

pub trait Settings<T: FloatT> {
    /// Return the core settings.
    fn core(&self) -> &CoreSettings<T>;

    /// Return the core settings (mutably).
    fn core_mut(&mut self) -> &mut CoreSettings<T>;

    /// Check that all fields hold permitted values
    fn validate(&self) -> Result<(), super::SettingsError>;
}

//! Linear system backends for the active set iteration.
//!
//! Every backend factors the working KKT matrix
//!
//! ```text
//! K = [ H   A'   B_W' ]
//!     [ A   0    0    ]
//!     [ B_W 0    0    ]
//! ```
//!
//! where `B_W` holds the inequality rows currently in the active set,
//! and supports adding or removing a single row of `B_W` between solves.

use super::{CoreSettings, RegularizationPolicy};
use crate::algebra::*;
use crate::qdldl::QDLDLError;
use thiserror::Error;

pub mod dense;
pub mod direct;

/// How the next KKT solve treats the current factorization
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub enum SolveType {
    /// first solve after initialization, factors are current
    Solve,
    /// rebuild the numeric factorization from the active set
    Refactor,
    /// factors have been edited since the last solve
    Update,
}

/// A single change to the active set
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub enum ActiveSetEdit {
    Add(usize),
    Drop(usize),
}

impl ActiveSetEdit {
    pub fn index(&self) -> usize {
        match *self {
            ActiveSetEdit::Add(i) | ActiveSetEdit::Drop(i) => i,
        }
    }
}

/// Error type returned by KKT backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KKTError {
    #[error("sparse factorization failed: {0}")]
    Qdldl(#[from] QDLDLError),
    #[error("inequality row {0} is linearly dependent on the working set")]
    DependentConstraint(usize),
    #[error("equality row {0} is linearly dependent on the preceding equalities")]
    DependentEquality(usize),
    #[error("Hessian block is not positive definite")]
    NotPositiveDefinite,
    #[error("KKT system dimensions are inconsistent")]
    Dimension,
    #[error("KKT solve produced non-finite values")]
    NonFinite,
}

/// Linear solver interface implemented by each KKT backend.
///
/// Multiplier vectors passed to or from a backend have one entry per
/// inequality row.  Entries for rows outside the working set are
/// ignored on input and zero on output.
pub trait KKTSolver<T: FloatT> {
    /// Rebuild the numeric factorization for the rows in `active`
    fn refactor(&mut self, active: &[usize], reg: &RegularizationPolicy<T>)
        -> Result<(), KKTError>;

    /// Add a row to, or remove a row from, the factored system
    fn edit(&mut self, edit: ActiveSetEdit) -> Result<(), KKTError>;

    /// Set the right hand side `[rhsx; rhsy; rhsl]` for the next solve
    fn setrhs(&mut self, rhsx: &[T], rhsy: &[T], rhsl: &[T]);

    /// Solve against the current factorization
    fn solve(
        &mut self,
        lhsx: &mut [T],
        lhsy: &mut [T],
        lhsl: &mut [T],
        settings: &CoreSettings<T>,
    ) -> Result<(), KKTError>;

    fn name(&self) -> &'static str;
}

//! Dense backend based on a Schur complement of the Hessian.
//!
//! Intended for small problems and for cross-checking the sparse
//! backend.  The Hessian must be positive definite after the static
//! shift, unless dynamic regularization is enabled.

mod schurkktsolver;
pub use schurkktsolver::*;

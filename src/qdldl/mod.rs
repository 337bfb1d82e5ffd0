//! Sparse $LDL^T$ factorization for quasidefinite matrices.
//!
//! Used by the sparse KKT backend of the solver.  Inputs are upper
//! triangular CSC matrices with every diagonal entry present.

#[allow(clippy::module_inception)]
mod qdldl;
pub use qdldl::*;

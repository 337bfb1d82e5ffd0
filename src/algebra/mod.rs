//! Linear algebra types and operations used by the active-set solver.
//!
//! Sparse data enters the solver in [`CscMatrix`] format.   All vector
//! arithmetic inside the solver goes through the [`VectorMath`] trait,
//! which is implemented for slices of any [`FloatT`] type, and all sparse
//! matrix arithmetic goes through [`MatrixMath`] and the matrix-vector
//! multiplication traits.
//!
//! A small column-major dense matrix type is used internally by the dense
//! KKT backend.

#![allow(non_snake_case)]

mod adjoint;
mod csc;
mod dense;
mod error_types;
mod floats;
mod math_traits;
mod matrix_traits;
mod matrix_types;
mod scalarmath;
mod symmetric;
mod vecmath;

pub use csc::*;
pub(crate) use dense::*;
pub use error_types::*;
pub use floats::*;
pub use math_traits::*;
pub use matrix_traits::*;
pub use matrix_types::*;

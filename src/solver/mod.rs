//! Active set solver main module.
//!
//! This module contains the main types and traits for the solver.
//!
//! The solver comes with a [default implementation](crate::solver::implementations::default)
//! of all required traits.   This produces a solver for problems of the form
//!
//! ```text
//! minimize    0.5 x'Hx + q'x
//! subject to  Ax = a,  Bx <= b
//! ```
//!
//! and is the most appropriate choice for nearly all users.
//!
//! It is also possible to implement a custom solver by defining a collection
//! of custom types that together implement all of the required core
//! [traits](crate::solver::core::traits) for objects in the core solver.

pub(crate) const _INFINITY_DEFAULT: f64 = 1e20;
// internal module structure
pub(crate) mod core;
pub mod implementations;
pub(crate) mod utils;

//Here we expose only part of the solver internals
//and rearrange public modules a bit to give a more
//user friendly API

pub use crate::solver::utils::infbounds::*;

//user facing traits and types required to interact with solver
pub use crate::solver::core::{
    ActiveSet, ActiveSetSolver, SettingsError, SolverError, SolverStatus, StepLength,
};

//the linear system backends
pub use crate::solver::core::kktsolvers;
pub use crate::solver::core::kktsolvers::{ActiveSetEdit, KKTError, SolveType};

//user facing traits required to define new implementations
pub use crate::solver::core::traits;
pub use crate::solver::core::traits::{StepAction, StepRecord};
pub use crate::solver::core::CoreSettings;

pub use crate::solver::implementations::default;
pub use crate::solver::implementations::default::*;

//!  __dasqp__ is a dual active-set solver for convex quadratic programs.  It solves
//!
//! $$
//! \begin{array}{rl}
//! \text{minimize} & \frac{1}{2}x^T H x + q^T x\\\\\[2ex\]
//!  \text{subject to} & Ax = a \\\\\[1ex\]
//!         & Bx \le b
//!  \end{array}
//! $$
//!
//! with decision variable $x \in \mathbb{R}^n$, data matrices
//! $H=H^\top \succeq 0$, $A \in \mathbb{R}^{m_e \times n}$,
//! $B \in \mathbb{R}^{m_i \times n}$ and vectors $q$, $a$, $b$ of
//! compatible dimension.
//!
//! The solver starts from the minimizer of the equality constrained problem
//! and adds or removes one inequality constraint per step.   The KKT system
//! of the current working set is never rebuilt from scratch between steps.
//! Instead its factorization is edited by one row at a time, either through
//! a sparse quasidefinite LDL factorization or a dense Schur complement
//! factorization with Cholesky updates.
//!
//! Steps can be taken one at a time with
//! [`step`](crate::solver::ActiveSetSolver::step), in batches with
//! [`steps`](crate::solver::ActiveSetSolver::steps), or until termination with
//! [`solve`](crate::solver::ActiveSetSolver::solve).
//!
//! ```no_run
//! use dasqp::algebra::*;
//! use dasqp::solver::*;
//!
//! // H = [4 1; 1 2] (upper triangle), q = [1, 1]
//! let H = CscMatrix::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![4., 1., 2.]);
//! let q = [1., 1.];
//!
//! // no equalities, x1 + x2 >= 1
//! let A = CscMatrix::zeros((0, 2));
//! let B = CscMatrix::new(1, 2, vec![0, 1, 2], vec![0, 0], vec![-1., -1.]);
//!
//! let settings = DefaultSettings::default();
//! let mut solver = DefaultSolver::new(&H, &q, &A, &[], &B, &[-1.], settings).unwrap();
//! solver.initialize().unwrap();
//! let status = solver.solve();
//! assert_eq!(status, SolverStatus::Optimal);
//! ```
//!
//! # License
//!
//! Licensed under Apache License, Version 2.0.

//Rust hates greek characters
#![allow(confusable_idents)]

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod algebra;
pub mod io;
pub mod qdldl;
pub mod solver;
pub mod timers;

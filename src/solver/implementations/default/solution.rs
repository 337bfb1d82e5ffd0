use super::*;
use crate::{
    algebra::*,
    solver::core::{traits::Solution, ActiveSet, SolverStatus},
};

/// Standard-form solver type implementing the [`Solution`](crate::solver::core::traits::Solution) trait
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DefaultSolution<T> {
    /// primal solution
    pub x: Vec<T>,
    /// equality multipliers
    pub y: Vec<T>,
    /// inequality multipliers, zero on inactive rows
    pub lambda: Vec<T>,
    /// final solver status
    pub status: SolverStatus,
    /// objective value `0.5 x'Hx + q'x`
    pub obj_val: T,
    /// number of iterations
    pub iterations: u32,
    /// solve time in seconds
    pub solve_time: f64,
    /// inequality rows active at termination
    pub active: Vec<usize>,
}

impl<T> DefaultSolution<T>
where
    T: FloatT,
{
    /// Create a new `DefaultSolution` object
    pub fn new(n: usize, me: usize, mi: usize) -> Self {
        Self {
            x: vec![T::zero(); n],
            y: vec![T::zero(); me],
            lambda: vec![T::zero(); mi],
            status: SolverStatus::NotFinished,
            obj_val: T::nan(),
            iterations: 0,
            solve_time: 0f64,
            active: Vec::new(),
        }
    }
}

impl<T> Solution<T> for DefaultSolution<T>
where
    T: FloatT,
{
    type D = DefaultProblemData<T>;
    type V = DefaultVariables<T>;
    type I = DefaultInfo<T>;

    fn finalize(
        &mut self,
        _data: &DefaultProblemData<T>,
        variables: &DefaultVariables<T>,
        info: &DefaultInfo<T>,
        active: &ActiveSet,
    ) {
        self.status = info.status;
        self.obj_val = info.obj_val;
        self.iterations = info.iterations;
        self.solve_time = info.solve_time;

        // variables are already unscaled here
        self.x.copy_from(&variables.x);
        self.y.copy_from(&variables.y);
        self.lambda.copy_from(&variables.lambda);

        self.active.clear();
        self.active.extend_from_slice(active.members());
    }
}

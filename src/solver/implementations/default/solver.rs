#![allow(non_snake_case)]
use super::*;
use crate::io::ConfigurablePrintTarget;
use crate::solver::core::{
    traits::Settings, ActiveSet, SolverError, StepState, SupportedStrategy, Solver,
};

use crate::algebra::*;
use crate::timers::*;

/// Solver for problems in standard QP form

pub type DefaultSolver<T = f64> = Solver<
    DefaultProblemData<T>,
    DefaultVariables<T>,
    DefaultResiduals<T>,
    DefaultKKTSystem<T>,
    DefaultInfo<T>,
    DefaultSolution<T>,
    DefaultSettings<T>,
>;

impl<T> DefaultSolver<T>
where
    T: FloatT,
{
    /// Create a solver for
    ///
    /// ```text
    /// minimize    0.5 x'Hx + q'x
    /// subject to  Ax = a,  Bx <= b
    /// ```
    ///
    /// `H` holds the upper triangle of the Hessian.  Inequality rows
    /// with `b_i` at or above [`get_infinity`](crate::solver::get_infinity)
    /// are treated as unbounded.
    pub fn new(
        H: &CscMatrix<T>,
        q: &[T],
        A: &CscMatrix<T>,
        a: &[T],
        B: &CscMatrix<T>,
        b: &[T],
        settings: DefaultSettings<T>,
    ) -> Result<Self, SolverError> {
        settings.validate()?;
        check_dimensions(H, q, A, a, B, b)?;

        let mut timers = Timers::default();
        let mut output;

        timeit! {timers => "setup"; {

        let info = DefaultInfo::<T>::new();
        let data = DefaultProblemData::<T>::new(H,q,A,a,B,b);
        let (n, me, mi) = (data.n, data.me, data.mi);

        let variables = DefaultVariables::<T>::new(n,me,mi);
        let residuals = DefaultResiduals::<T>::new(n,me,mi);

        // the KKT backend is built by initialize, once the
        // data has been scaled
        let kktsystem = DefaultKKTSystem::<T>::new(n,me,mi);

        // user facing results go here.
        let solution = DefaultSolution::<T>::new(n,me,mi);

        let strategy = SupportedStrategy::new(settings.mode, settings.tuned_rounds);

        output = Self{data,variables,residuals,kktsystem,
            active: ActiveSet::new(mi), state: StepState::default(),
            info,solution,settings,strategy,timers: None, warm_rows: Vec::new()};

        }} //end "setup" timer.

        //now that the timer is finished we can swap our
        //timer object into the solver structure
        output.timers.replace(timers);

        Ok(output)
    }
}

fn check_dimensions<T: FloatT>(
    H: &CscMatrix<T>,
    q: &[T],
    A: &CscMatrix<T>,
    a: &[T],
    B: &CscMatrix<T>,
    b: &[T],
) -> Result<(), SolverError> {
    H.check_format()?;
    A.check_format()?;
    B.check_format()?;

    let n = q.len();
    if H.m != n || H.n != n {
        return Err(SolverError::BadInput("H must be square with one column per variable"));
    }
    if !H.is_triu() {
        return Err(SolverError::BadInput("H must be upper triangular"));
    }
    if A.n != n || A.m != a.len() {
        return Err(SolverError::BadInput("A is incompatible with x or a"));
    }
    if B.n != n || B.m != b.len() {
        return Err(SolverError::BadInput("B is incompatible with x or b"));
    }
    let finite = |v: &[T]| v.iter().all(|x| x.is_finite());
    if !finite(&H.nzval) || !finite(&A.nzval) || !finite(&B.nzval) || !finite(q) || !finite(a) {
        return Err(SolverError::BadInput("problem data must be finite"));
    }
    if b.iter().any(|x| x.is_nan()) {
        return Err(SolverError::BadInput("b must not contain NaN"));
    }
    Ok(())
}

impl<T> ConfigurablePrintTarget for DefaultSolver<T>
where
    T: FloatT,
{
    fn print_to_stdout(&mut self) {
        self.info.print_to_stdout()
    }
    fn print_to_file(&mut self, file: std::fs::File) {
        self.info.print_to_file(file)
    }
    fn print_to_stream(&mut self, stream: Box<dyn std::io::Write + Send + Sync>) {
        self.info.print_to_stream(stream)
    }
    fn print_to_buffer(&mut self) {
        self.info.print_to_buffer()
    }
    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.info.get_print_buffer()
    }
}

impl<T> DefaultSolver<T>
where
    T: FloatT,
{
    /// Time spent in setup, initialization and stepping so far
    pub fn elapsed(&self) -> std::time::Duration {
        self.timers
            .as_ref()
            .map_or(std::time::Duration::ZERO, |t| t.total_time())
    }
}

use super::*;
use crate::algebra::*;
use crate::io::PrintTarget;
use crate::solver::core::{
    traits::{Info, StepAction, StepRecord},
    ActiveSet, SolverStatus,
};
use crate::timers::*;

/// Standard-form solver type implementing the [`Info`](crate::solver::core::traits::Info) and [`InfoPrint`](crate::solver::core::traits::InfoPrint) traits

#[derive(Default, Debug)]
pub struct DefaultInfo<T> {
    /// completed iterations
    pub iterations: u32,
    /// violated inequality rows at the last candidate selection
    pub num_violated: usize,
    pub n_active: usize,
    pub primal_step: Option<T>,
    pub dual_step: Option<T>,
    pub action: StepAction,

    // norms of the final point
    pub cons_sat: T,
    pub lag_res: T,
    pub complementarity: T,
    pub nonneg: T,
    pub obj_val: T,

    /// name of the KKT backend in use
    pub backend: &'static str,
    /// every diagnostic raised since the last initialization
    pub diagnostics: Vec<String>,

    pub solve_time: f64,
    pub status: SolverStatus,

    pub(crate) stream: PrintTarget,
}

impl<T> DefaultInfo<T>
where
    T: FloatT,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// most recent diagnostic, if any
    pub fn last_diagnostic(&self) -> Option<&str> {
        self.diagnostics.last().map(|s| s.as_str())
    }
}

impl<T> Info<T> for DefaultInfo<T>
where
    T: FloatT,
{
    type V = DefaultVariables<T>;
    type R = DefaultResiduals<T>;

    fn reset(&mut self, timers: &mut Timers) {
        self.status = SolverStatus::NotFinished;
        self.iterations = 0;
        self.num_violated = 0;
        self.n_active = 0;
        self.primal_step = None;
        self.dual_step = None;
        self.action = StepAction::None;
        self.diagnostics.clear();
        self.solve_time = 0f64;

        timers.reset_timer("initialize");
        timers.reset_timer("step");
        timers.reset_timer("classify");
    }

    fn save_step(&mut self, record: StepRecord<T>, active: &ActiveSet) {
        self.iterations = record.iteration;
        self.num_violated = record.num_violated;
        self.primal_step = record.primal_step;
        self.dual_step = record.dual_step;
        self.action = record.action;
        self.n_active = active.n_active();
    }

    fn record_diagnostic(&mut self, msg: &str) {
        self.diagnostics.push(msg.to_string());
    }

    fn record_backend(&mut self, name: &'static str) {
        self.backend = name;
    }

    fn classify(
        &mut self,
        converged: bool,
        residuals: &DefaultResiduals<T>,
        settings: &DefaultSettings<T>,
    ) -> SolverStatus {
        self.cons_sat = residuals.cons_sat;
        self.lag_res = residuals.lag_res;
        self.complementarity = residuals.complementarity;
        self.nonneg = residuals.nonneg;
        self.obj_val = residuals.obj_val;

        if !converged {
            return SolverStatus::Infeasible;
        }
        classify_norms(
            residuals.lag_res,
            residuals.cons_sat,
            residuals.nonneg,
            settings.eps_abs,
        )
    }

    fn finalize(&mut self, _residuals: &DefaultResiduals<T>, timers: &mut Timers) {
        self.solve_time = (timers.elapsed("initialize")
            + timers.elapsed("step")
            + timers.elapsed("classify"))
        .as_secs_f64();
    }

    fn get_status(&self) -> SolverStatus {
        self.status
    }

    fn set_status(&mut self, status: SolverStatus) {
        self.status = status;
    }
}

/// Status of a converged run from its residual norms.
///
/// Complementarity does not take part.
pub fn classify_norms<T: FloatT>(lag_res: T, cons_sat: T, nonneg: T, eps: T) -> SolverStatus {
    if lag_res <= eps && cons_sat <= eps && nonneg <= eps {
        SolverStatus::Optimal
    } else if cons_sat <= eps {
        SolverStatus::Inaccurate
    } else {
        SolverStatus::NotConverged
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_classify_norms() {
        let eps = 1e-6;
        assert_eq!(classify_norms(0., 0., 0., eps), SolverStatus::Optimal);
        assert_eq!(classify_norms(eps, eps, eps, eps), SolverStatus::Optimal);
        assert_eq!(classify_norms(1., 0., 0., eps), SolverStatus::Inaccurate);
        assert_eq!(classify_norms(0., 0., 1., eps), SolverStatus::Inaccurate);
        assert_eq!(classify_norms(0., 1., 0., eps), SolverStatus::NotConverged);
        assert_eq!(classify_norms(f64::NAN, 0., 0., eps), SolverStatus::Inaccurate);
        assert_eq!(classify_norms(0., f64::NAN, 0., eps), SolverStatus::NotConverged);
    }

    #[test]
    fn test_classify_unconverged() {
        let settings = DefaultSettings::<f64>::default();
        let mut residuals = DefaultResiduals::<f64>::new(1, 0, 0);
        residuals.cons_sat = 0.;
        residuals.lag_res = 0.;
        residuals.nonneg = 0.;
        residuals.complementarity = 5.;
        residuals.obj_val = -1.;

        let mut info = DefaultInfo::<f64>::new();
        assert_eq!(
            info.classify(true, &residuals, &settings),
            SolverStatus::Optimal
        );
        assert_eq!(info.complementarity, 5.);
        assert_eq!(
            info.classify(false, &residuals, &settings),
            SolverStatus::Infeasible
        );
    }

    #[test]
    fn test_diagnostics() {
        let mut info = DefaultInfo::<f64>::new();
        let mut timers = Timers::default();
        assert_eq!(info.last_diagnostic(), None);
        info.record_diagnostic("All constraints are used");
        assert_eq!(info.last_diagnostic(), Some("All constraints are used"));
        info.reset(&mut timers);
        assert!(info.diagnostics.is_empty());
    }
}

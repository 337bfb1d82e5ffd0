use super::*;
use crate::algebra::*;
use crate::solver::core::{
    dual_step_length,
    traits::{Settings, Variables},
    ActiveSet, DualStep,
};

// ---------------
// Variables type for default problem format
// ---------------

/// Standard-form solver type implementing the [`Variables`](crate::solver::core::traits::Variables) trait
pub struct DefaultVariables<T> {
    /// primal variables
    pub x: Vec<T>,
    /// equality multipliers
    pub y: Vec<T>,
    /// inequality multipliers, nonzero only on active rows
    pub lambda: Vec<T>,
    /// primal direction
    pub dx: Vec<T>,
    /// equality multiplier direction
    pub dy: Vec<T>,
    /// inequality multiplier direction, zero on inactive rows
    pub dlambda: Vec<T>,
}

impl<T: std::fmt::Display + std::fmt::Debug> std::fmt::Debug for DefaultVariables<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x: {:?}\ny: {:?}\nlambda: {:?}\n",
            self.x, self.y, self.lambda
        )
    }
}

impl<T> DefaultVariables<T>
where
    T: FloatT,
{
    /// Create a new `DefaultVariables` object
    pub fn new(n: usize, me: usize, mi: usize) -> Self {
        Self {
            x: vec![T::zero(); n],
            y: vec![T::zero(); me],
            lambda: vec![T::zero(); mi],
            dx: vec![T::zero(); n],
            dy: vec![T::zero(); me],
            dlambda: vec![T::zero(); mi],
        }
    }

    /// Largest violation `max(B_i x - b_i, 0)` over finite rows
    pub fn max_violation(&self, data: &DefaultProblemData<T>) -> T {
        data.finite_rows
            .iter()
            .map(|&i| self.candidate_violation(data, i))
            .fold(T::zero(), T::max)
    }
}

impl<T> Variables<T> for DefaultVariables<T>
where
    T: FloatT,
{
    type D = DefaultProblemData<T>;
    type SE = DefaultSettings<T>;

    fn reset(&mut self) {
        self.x.set(T::zero());
        self.y.set(T::zero());
        self.lambda.set(T::zero());
        self.dx.set(T::zero());
        self.dy.set(T::zero());
        self.dlambda.set(T::zero());
    }

    fn primal_feasibility(
        &self,
        data: &DefaultProblemData<T>,
        active: &ActiveSet,
        settings: &DefaultSettings<T>,
    ) -> (usize, Option<usize>) {
        let tol = settings.core().feasibility_tolerance;
        let mut num_violated = 0;
        let mut candidate: Option<(T, usize)> = None;

        for &i in data.finite_rows.iter() {
            let violation = self.candidate_violation(data, i);
            if !(violation > tol) {
                continue;
            }
            num_violated += 1;
            if active.contains(i) {
                continue;
            }
            // strict comparison keeps the lowest index on ties
            match candidate {
                Some((vbest, _)) if violation <= vbest => {}
                _ => candidate = Some((violation, i)),
            }
        }

        (num_violated, candidate.map(|(_, i)| i))
    }

    fn candidate_violation(&self, data: &DefaultProblemData<T>, p: usize) -> T {
        data.Bt.col_dot(p, &self.x) - data.b[p]
    }

    fn candidate_slope(&self, data: &DefaultProblemData<T>, p: usize) -> T {
        data.Bt.col_dot(p, &self.dx)
    }

    fn dual_step_length(&self, active: &ActiveSet, settings: &DefaultSettings<T>) -> DualStep<T> {
        dual_step_length(
            &self.lambda,
            &self.dlambda,
            active,
            settings.core().step_tolerance,
        )
    }

    fn update_primal(&mut self, t: T) {
        self.x.axpby(t, &self.dx, T::one());
    }

    fn update_dual(&mut self, t: T, active: &ActiveSet) {
        self.y.axpby(t, &self.dy, T::one());
        for &j in active {
            self.lambda[j] += t * self.dlambda[j];
        }
    }

    fn add_activation_dual(&mut self, p: usize, t: T) {
        self.lambda[p] += t;
    }

    fn zero_dual(&mut self, j: usize) {
        self.lambda[j] = T::zero();
    }

    fn negative_duals(&self, active: &ActiveSet) -> Vec<usize> {
        active
            .iter()
            .copied()
            .filter(|&j| self.lambda[j] < T::zero())
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::solver::core::kktsolvers::ActiveSetEdit;

    fn data() -> DefaultProblemData<f64> {
        let H = CscMatrix::identity(2);
        let A = CscMatrix::<f64>::zeros((0, 2));
        let B = CscMatrix::from(&[
            [1., 0.],  //
            [0., 1.],  //
            [1., 1.],  //
            [-1., 0.], //
        ]);
        DefaultProblemData::new(&H, &[0., 0.], &A, &[], &B, &[1., 1., 1., 1e30])
    }

    #[test]
    fn test_primal_feasibility() {
        let data = data();
        let settings = DefaultSettings::<f64>::default();
        let mut vars = DefaultVariables::<f64>::new(2, 0, 4);
        let mut active = ActiveSet::new(4);

        vars.x.copy_from(&[2., 2.]);
        // rows 0 and 1 tie with violation 1, row 2 wins with 3
        assert_eq!(vars.primal_feasibility(&data, &active, &settings), (3, Some(2)));

        active.apply(ActiveSetEdit::Add(2));
        assert_eq!(vars.primal_feasibility(&data, &active, &settings), (3, Some(0)));

        // the infinite row is never counted
        vars.x.copy_from(&[-5., 0.]);
        assert_eq!(vars.primal_feasibility(&data, &active, &settings), (0, None));

        active.apply(ActiveSetEdit::Add(0));
        active.apply(ActiveSetEdit::Add(1));
        vars.x.copy_from(&[2., 2.]);
        assert_eq!(vars.primal_feasibility(&data, &active, &settings), (3, None));
        assert_eq!(vars.max_violation(&data), 3.);
    }

    #[test]
    fn test_updates() {
        let mut vars = DefaultVariables::<f64>::new(2, 1, 4);
        let mut active = ActiveSet::new(4);
        active.apply(ActiveSetEdit::Add(1));
        active.apply(ActiveSetEdit::Add(3));

        vars.lambda.copy_from(&[0., 1., 0., 2.]);
        vars.dlambda.copy_from(&[5., -1., 5., 1.]);
        vars.dx.copy_from(&[1., -1.]);
        vars.dy.copy_from(&[2.]);

        vars.update_primal(0.5);
        assert_eq!(vars.y, vec![0.]);
        vars.update_dual(0.5, &active);
        vars.add_activation_dual(2, 0.5);
        assert_eq!(vars.x, vec![0.5, -0.5]);
        assert_eq!(vars.y, vec![1.]);
        // inactive rows are untouched by the dual update
        assert_eq!(vars.lambda, vec![0., 0.5, 0.5, 2.5]);

        vars.lambda[3] = -1.;
        assert_eq!(vars.negative_duals(&active), vec![3]);
        vars.zero_dual(3);
        assert!(vars.negative_duals(&active).is_empty());
    }
}

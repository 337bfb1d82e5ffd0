#![allow(non_snake_case)]
use super::*;
use crate::algebra::*;
use crate::solver::core::traits::Residuals;
use itertools::izip;

// ---------------
// Residuals type for default problem format
// ---------------

/// Standard-form solver type implementing the [`Residuals`](crate::solver::core::traits::Residuals) trait
///
/// All norms are infinity norms, computed on the unscaled problem.
/// Inequality rows without a finite bound are left out.

pub struct DefaultResiduals<T> {
    // the norms used for classification
    pub cons_sat: T,
    pub lag_res: T,
    pub complementarity: T,
    pub nonneg: T,

    /// objective `0.5 x'Hx + q'x`
    pub obj_val: T,

    // Hx + q + A'y + B'lambda
    pub r_lag: Vec<T>,
    // Ax - a
    pub r_eq: Vec<T>,
    // Bx - b
    pub r_ineq: Vec<T>,
}

impl<T> DefaultResiduals<T>
where
    T: FloatT,
{
    pub fn new(n: usize, me: usize, mi: usize) -> Self {
        Self {
            cons_sat: T::nan(),
            lag_res: T::nan(),
            complementarity: T::nan(),
            nonneg: T::nan(),
            obj_val: T::nan(),
            r_lag: vec![T::zero(); n],
            r_eq: vec![T::zero(); me],
            r_ineq: vec![T::zero(); mi],
        }
    }
}

impl<T> Residuals<T> for DefaultResiduals<T>
where
    T: FloatT,
{
    type D = DefaultProblemData<T>;
    type V = DefaultVariables<T>;

    fn update(&mut self, variables: &DefaultVariables<T>, data: &DefaultProblemData<T>) {
        let (x, y, lambda) = (&variables.x, &variables.y, &variables.lambda);

        //r_lag = Hx + q + A'y + B'lambda, H treated as symmetric
        self.r_lag.copy_from(&data.q);
        data.H.sym().symv(&mut self.r_lag, x, T::one(), T::one());
        data.At.gemv(&mut self.r_lag, y, T::one(), T::one());
        data.Bt.gemv(&mut self.r_lag, lambda, T::one(), T::one());
        self.lag_res = self.r_lag.norm_inf();

        //r_eq = Ax - a
        self.r_eq.copy_from(&data.a);
        data.At.t().gemv(&mut self.r_eq, x, T::one(), -T::one());

        //r_ineq = Bx - b, finite rows only
        self.r_ineq.copy_from(&data.b);
        data.Bt.t().gemv(&mut self.r_ineq, x, T::one(), -T::one());

        let mut violation = T::zero();
        let mut complementarity = T::zero();
        for &i in data.finite_rows.iter() {
            let r = self.r_ineq[i];
            violation = T::max(violation, r);
            complementarity = T::max(complementarity, T::abs(lambda[i] * r));
        }
        self.cons_sat = T::max(self.r_eq.norm_inf(), violation);
        self.complementarity = complementarity;

        self.nonneg = lambda.iter().fold(T::zero(), |acc, &l| T::max(acc, -l));

        // 0.5 x'Hx + q'x
        let mut obj = T::zero();
        for (&qi, &xi) in izip!(&data.q, x) {
            obj += qi * xi;
        }
        let half: T = (0.5).as_T();
        self.obj_val = half * data.H.quad_form(x, x) + obj;
    }
}

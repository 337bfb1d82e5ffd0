use crate::algebra::*;
use crate::solver::implementations::default::SolverMode;
use enum_dispatch::*;

/// Regularization applied to the KKT factorization for one round
/// of the active set iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegularizationPolicy<T> {
    /// static diagonal shift, `+eps` on the Hessian block and
    /// `-eps` on the constraint block
    pub static_eps: T,
    /// replace small pivots during factorization
    pub dynamic: bool,
}

/// Behaviour that distinguishes the solver variants.
#[enum_dispatch]
pub trait SolveStrategy {
    /// multiplier on the static regularization in the
    /// given restart round (0 on the first pass)
    fn static_scale(&self, round: u32) -> f64;

    fn dynamic_regularization(&self) -> bool;

    /// true if another restart is allowed after `rounds_used` restarts
    fn allows_retry(&self, rounds_used: u32) -> bool;

    /// true if a starting point that violates the equality
    /// constraints is an initialization error
    fn strict_initialization(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct TunedStrategy {
    rounds: u32,
}

#[derive(Debug, Clone)]
pub struct FixedStrategy;

#[derive(Debug, Clone)]
pub struct AutoStrategy;

#[enum_dispatch(SolveStrategy)]
#[derive(Debug, Clone)]
pub enum SupportedStrategy {
    TunedStrategy,
    FixedStrategy,
    AutoStrategy,
}

impl SupportedStrategy {
    pub fn new(mode: SolverMode, tuned_rounds: u32) -> Self {
        match mode {
            SolverMode::Tuned => TunedStrategy {
                rounds: tuned_rounds,
            }
            .into(),
            SolverMode::Fixed => FixedStrategy.into(),
            SolverMode::Auto => AutoStrategy.into(),
        }
    }

    /// regularization used in the given restart round
    pub fn regularization<T: FloatT>(&self, static_eps: T, round: u32) -> RegularizationPolicy<T> {
        RegularizationPolicy {
            static_eps: static_eps * self.static_scale(round).as_T(),
            dynamic: self.dynamic_regularization(),
        }
    }
}

impl SolveStrategy for TunedStrategy {
    fn static_scale(&self, round: u32) -> f64 {
        f64::powi(0.1, round as i32)
    }

    fn dynamic_regularization(&self) -> bool {
        false
    }

    fn allows_retry(&self, rounds_used: u32) -> bool {
        rounds_used < self.rounds
    }

    fn strict_initialization(&self) -> bool {
        false
    }
}

impl SolveStrategy for FixedStrategy {
    fn static_scale(&self, _round: u32) -> f64 {
        1.0
    }

    fn dynamic_regularization(&self) -> bool {
        false
    }

    fn allows_retry(&self, _rounds_used: u32) -> bool {
        false
    }

    fn strict_initialization(&self) -> bool {
        true
    }
}

impl SolveStrategy for AutoStrategy {
    fn static_scale(&self, _round: u32) -> f64 {
        1.0
    }

    fn dynamic_regularization(&self) -> bool {
        true
    }

    fn allows_retry(&self, _rounds_used: u32) -> bool {
        false
    }

    fn strict_initialization(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_strategy_dispatch() {
        let tuned = SupportedStrategy::new(SolverMode::Tuned, 4);
        assert!(tuned.allows_retry(3));
        assert!(!tuned.allows_retry(4));
        assert!(!tuned.strict_initialization());

        let reg = tuned.regularization(1e-8_f64, 2);
        assert!((reg.static_eps - 1e-10).abs() < 1e-22);
        assert!(!reg.dynamic);

        let fixed = SupportedStrategy::new(SolverMode::Fixed, 4);
        assert!(!fixed.allows_retry(0));
        assert!(fixed.strict_initialization());
        assert_eq!(fixed.regularization(1e-8, 3).static_eps, 1e-8);

        let auto = SupportedStrategy::new(SolverMode::Auto, 4);
        assert!(!auto.allows_retry(0));
        assert!(auto.regularization(1e-8, 0).dynamic);
    }
}

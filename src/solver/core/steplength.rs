use crate::algebra::*;

/// Length of a step in a ratio test.   `Unbounded` means that
/// nothing limits the step in that direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepLength<T> {
    Finite(T),
    Unbounded,
}

impl<T> StepLength<T>
where
    T: FloatT,
{
    pub fn is_unbounded(&self) -> bool {
        matches!(self, StepLength::Unbounded)
    }

    pub fn value(&self) -> Option<T> {
        match *self {
            StepLength::Finite(t) => Some(t),
            StepLength::Unbounded => None,
        }
    }
}

impl<T> std::fmt::Display for StepLength<T>
where
    T: FloatT,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StepLength::Finite(t) => write!(f, "{:.2e}", t),
            StepLength::Unbounded => write!(f, "inf"),
        }
    }
}

/// Result of the dual ratio test: the step length and the active
/// row whose multiplier reaches zero first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualStep<T> {
    pub length: StepLength<T>,
    pub drop: Option<usize>,
}

/// The step taken by one iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommittedStep<T> {
    /// nothing limits the step in either direction
    Unbounded,
    /// multipliers move, x stays.  The row is removed.
    DualOnly { length: T, drop: usize },
    /// full step that makes the candidate row active
    Add { length: T },
    /// full step limited by a multiplier of an active row
    Drop { length: T, drop: usize },
}

/// Step that drives the candidate's violation to zero.
///
/// `slope` is the rate of change of the candidate row along the
/// direction, and is nonpositive for a descent direction.  Slopes no
/// steeper than `-tol` give an unbounded step.
pub fn primal_step_length<T: FloatT>(violation: T, slope: T, tol: T) -> StepLength<T> {
    let rate = -slope;
    if !(rate > tol) || !violation.is_finite() {
        return StepLength::Unbounded;
    }
    StepLength::Finite(T::max(violation / rate, T::zero()))
}

/// Largest step keeping every active multiplier nonnegative.
///
/// Only rows with `dlambda < -tol` limit the step.  Ties go to the
/// row that appears first in `active`.
pub fn dual_step_length<'a, T: FloatT>(
    lambda: &[T],
    dlambda: &[T],
    active: impl IntoIterator<Item = &'a usize>,
    tol: T,
) -> DualStep<T> {
    let mut best: Option<(T, usize)> = None;

    for &j in active {
        let dl = dlambda[j];
        if !(dl < -tol) {
            continue;
        }
        let t = T::max(lambda[j] / (-dl), T::zero());
        match best {
            Some((tbest, _)) if t >= tbest => {}
            _ => best = Some((t, j)),
        }
    }

    match best {
        Some((t, j)) => DualStep {
            length: StepLength::Finite(t),
            drop: Some(j),
        },
        None => DualStep {
            length: StepLength::Unbounded,
            drop: None,
        },
    }
}

/// Choose the committed step from the two ratio tests.  An exact
/// tie between the primal and dual lengths is an add.
pub fn commit_step<T: FloatT>(primal: StepLength<T>, dual: DualStep<T>) -> CommittedStep<T> {
    use StepLength::*;

    match (primal, dual.length, dual.drop) {
        (Finite(tp), Finite(td), Some(j)) => {
            if tp <= td {
                CommittedStep::Add { length: tp }
            } else {
                CommittedStep::Drop {
                    length: td,
                    drop: j,
                }
            }
        }
        (Unbounded, Finite(td), Some(j)) => CommittedStep::DualOnly {
            length: td,
            drop: j,
        },
        (Finite(tp), _, _) => CommittedStep::Add { length: tp },
        (Unbounded, _, _) => CommittedStep::Unbounded,
    }
}

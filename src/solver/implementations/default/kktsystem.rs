use super::*;
use crate::solver::core::{
    kktsolvers::{dense::*, direct::*, *},
    traits::{KKTSystem, Settings},
    ActiveSet, RegularizationPolicy,
};

use crate::algebra::*;

// Send lets solver objects move between threads.

type BoxedKKTSolver<T> = Box<dyn KKTSolver<T> + Send>;

/// Standard-form solver type implementing the [`KKTSystem`](crate::solver::core::traits::KKTSystem) trait

pub struct DefaultKKTSystem<T> {
    // created by initialize
    kktsolver: Option<BoxedKKTSolver<T>>,

    // regularization of the most recent factorization
    reg: RegularizationPolicy<T>,

    // right hand side of the direction solves
    rhsx: Vec<T>,
    rhsy: Vec<T>,
    rhsl: Vec<T>,

    // work vectors for the starting point
    workx: Vec<T>,
    workl: Vec<T>,
}

impl<T> DefaultKKTSystem<T>
where
    T: FloatT,
{
    pub fn new(n: usize, me: usize, mi: usize) -> Self {
        Self {
            kktsolver: None,
            reg: RegularizationPolicy {
                static_eps: T::zero(),
                dynamic: false,
            },
            rhsx: vec![T::zero(); n],
            rhsy: vec![T::zero(); me],
            rhsl: vec![T::zero(); mi],
            workx: vec![T::zero(); n],
            workl: vec![T::zero(); mi],
        }
    }

    fn backend(&mut self) -> Result<&mut BoxedKKTSolver<T>, KKTError> {
        self.kktsolver.as_mut().ok_or(KKTError::Dimension)
    }
}

impl<T> KKTSystem<T> for DefaultKKTSystem<T>
where
    T: FloatT,
{
    type D = DefaultProblemData<T>;
    type V = DefaultVariables<T>;
    type SE = DefaultSettings<T>;

    fn initialize(
        &mut self,
        data: &DefaultProblemData<T>,
        settings: &DefaultSettings<T>,
        reg: &RegularizationPolicy<T>,
    ) -> Result<(), KKTError> {
        let (H, At, Bt) = (&data.H, &data.At, &data.Bt);
        let settings = settings.core();

        let kktsolver: BoxedKKTSolver<T> = match settings.kkt_backend.as_str() {
            "dense" => Box::new(DenseKKTSolver::<T>::new(H, At, Bt, settings, reg)?),
            _ => Box::new(DirectLDLKKTSolver::<T>::new(H, At, Bt, settings, reg)?),
        };
        self.kktsolver = Some(kktsolver);
        self.reg = *reg;
        Ok(())
    }

    fn solve_initial_point(
        &mut self,
        variables: &mut DefaultVariables<T>,
        data: &DefaultProblemData<T>,
        active: &ActiveSet,
        settings: &DefaultSettings<T>,
        reg: &RegularizationPolicy<T>,
    ) -> Result<(), KKTError> {
        self.reg = *reg;

        // [-q; a; b_W]
        self.workx.copy_from(&data.q).negate();
        self.workl.set(T::zero());
        for &i in active {
            self.workl[i] = data.b[i];
        }

        let kktsolver = self.kktsolver.as_mut().ok_or(KKTError::Dimension)?;
        kktsolver.refactor(active.members(), reg)?;
        kktsolver.setrhs(&self.workx, &data.a, &self.workl);
        kktsolver.solve(
            &mut variables.x,
            &mut variables.y,
            &mut variables.lambda,
            settings.core(),
        )
    }

    fn update_rhs(&mut self, data: &DefaultProblemData<T>, p: usize) {
        // [-B_p'; 0; 0]
        self.rhsx.set(T::zero());
        data.Bt.col_axpy(p, -T::one(), &mut self.rhsx);
        self.rhsy.set(T::zero());
        self.rhsl.set(T::zero());
    }

    fn solve(
        &mut self,
        variables: &mut DefaultVariables<T>,
        mode: SolveType,
        active: &ActiveSet,
        settings: &DefaultSettings<T>,
    ) -> Result<(), KKTError> {
        let reg = self.reg;
        let kktsolver = self.kktsolver.as_mut().ok_or(KKTError::Dimension)?;

        // Solve and Update both use the factors as they stand.
        // Edits have already been applied to them.
        if mode == SolveType::Refactor {
            kktsolver.refactor(active.members(), &reg)?;
        }

        kktsolver.setrhs(&self.rhsx, &self.rhsy, &self.rhsl);
        kktsolver.solve(
            &mut variables.dx,
            &mut variables.dy,
            &mut variables.dlambda,
            settings.core(),
        )
    }

    fn edit(&mut self, edit: ActiveSetEdit) -> Result<(), KKTError> {
        self.backend()?.edit(edit)
    }

    fn backend_name(&self) -> &'static str {
        self.kktsolver.as_ref().map_or("none", |k| k.name())
    }
}

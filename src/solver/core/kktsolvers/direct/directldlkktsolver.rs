#![allow(non_snake_case)]

use super::*;
use crate::algebra::*;
use crate::qdldl::*;
use crate::solver::core::kktsolvers::{ActiveSetEdit, KKTError, KKTSolver};
use crate::solver::core::{CoreSettings, RegularizationPolicy};
use std::iter::zip;

// -------------------------------------
// KKTSolver using a sparse QDLDL factorisation
// -------------------------------------

// The full KKT matrix over all inequality rows is assembled once.
// Rows outside the working set are decoupled by zeroing their
// coupling entries and placing -1 on their diagonal, so the sparsity
// pattern (and the symbolic analysis) never changes.

pub struct DirectLDLKKTSolver<T> {
    // problem dimensions
    n: usize,
    me: usize,
    mi: usize,

    // Left and right hand sides for solves
    x: Vec<T>,
    b: Vec<T>,

    // internal workspace for IR scheme
    // and static offsetting of KKT
    work1: Vec<T>,
    work2: Vec<T>,

    // KKT mapping from problem data to KKT
    map: LDLDataMap,

    // the expected signs of D in KKT = LDL^T
    dsigns: Vec<i8>,

    // inequality data, used to restore rows entering the working set
    Bt: CscMatrix<T>,
    is_active: Vec<bool>,

    //unpermuted and unregularized KKT matrix
    KKT: CscMatrix<T>,

    factors: QDLDLFactorisation<T>,

    // regularization of the last refactor, and
    // whether the KKT values have changed since
    reg: RegularizationPolicy<T>,
    is_stale: bool,
}

impl<T> DirectLDLKKTSolver<T>
where
    T: FloatT,
{
    pub fn new(
        H: &CscMatrix<T>,
        At: &CscMatrix<T>,
        Bt: &CscMatrix<T>,
        settings: &CoreSettings<T>,
        reg: &RegularizationPolicy<T>,
    ) -> Result<Self, KKTError> {
        let (n, me, mi) = (H.n, At.n, Bt.n);
        if At.m != n || Bt.m != n || !H.is_square() {
            return Err(KKTError::Dimension);
        }
        let dim = n + me + mi;

        let (mut KKT, map) = assemble_kkt_matrix(H, At, Bt);

        // the expected signs of D in LDL
        let mut dsigns = vec![1_i8; dim];
        dsigns[n..].fill(-1);

        // start with nothing in the working set
        for i in 0..mi {
            _update_values_KKT(&mut KKT, map.Bt_column(Bt, i), &vec![T::zero(); Bt.colptr[i + 1] - Bt.colptr[i]]);
            KKT.nzval[map.diag_full[n + me + i]] = -T::one();
        }

        // factor only to fix the ordering and memory.
        // refactor is called before any solve.
        let opts = QDLDLSettingsBuilder::default()
            .Dsigns(dsigns.clone())
            .regularize_enable(true)
            .regularize_eps(settings.dynamic_regularization_eps)
            .regularize_delta(settings.dynamic_regularization_delta)
            .amd_dense_scale(1.5)
            .build()
            .map_err(|_| KKTError::Dimension)?;

        let factors = QDLDLFactorisation::<T>::new(&KKT, Some(opts))?;

        Ok(Self {
            n,
            me,
            mi,
            x: vec![T::zero(); dim],
            b: vec![T::zero(); dim],
            work1: vec![T::zero(); dim],
            work2: vec![T::zero(); dim],
            map,
            dsigns,
            Bt: Bt.clone(),
            is_active: vec![false; mi],
            KKT,
            factors,
            reg: *reg,
            is_stale: true,
        })
    }
}

impl<T> KKTSolver<T> for DirectLDLKKTSolver<T>
where
    T: FloatT,
{
    fn refactor(
        &mut self,
        active: &[usize],
        reg: &RegularizationPolicy<T>,
    ) -> Result<(), KKTError> {
        let mut target = vec![false; self.mi];
        for &i in active {
            target[i] = true;
        }
        for (i, &make_active) in target.iter().enumerate() {
            if make_active != self.is_active[i] {
                self.set_row_coupling(i, make_active);
            }
        }
        self.reg = *reg;
        self.regularize_and_refactor()
    }

    fn edit(&mut self, edit: ActiveSetEdit) -> Result<(), KKTError> {
        let i = edit.index();
        if i >= self.mi {
            return Err(KKTError::Dimension);
        }
        let make_active = matches!(edit, ActiveSetEdit::Add(_));
        self.set_row_coupling(i, make_active);
        Ok(())
    }

    fn setrhs(&mut self, rhsx: &[T], rhsy: &[T], rhsl: &[T]) {
        let (n, me) = (self.n, self.me);

        self.b[0..n].copy_from(rhsx);
        self.b[n..(n + me)].copy_from(rhsy);
        for (bi, (&r, &act)) in zip(&mut self.b[(n + me)..], zip(rhsl, &self.is_active)) {
            *bi = if act { r } else { T::zero() };
        }
    }

    fn solve(
        &mut self,
        lhsx: &mut [T],
        lhsy: &mut [T],
        lhsl: &mut [T],
        settings: &CoreSettings<T>,
    ) -> Result<(), KKTError> {
        if self.is_stale {
            self.regularize_and_refactor()?;
        }

        self.x.copy_from(&self.b);
        self.factors.solve(&mut self.x);

        if settings.iterative_refinement_enable {
            self.iterative_refinement(settings);
        }
        if !self.x.is_finite() {
            return Err(KKTError::NonFinite);
        }

        let (n, me) = (self.n, self.me);
        lhsx.copy_from(&self.x[0..n]);
        lhsy.copy_from(&self.x[n..(n + me)]);
        for (l, (&v, &act)) in zip(lhsl, zip(&self.x[(n + me)..], &self.is_active)) {
            *l = if act { v } else { T::zero() };
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "qdldl"
    }
}

impl<T> DirectLDLKKTSolver<T>
where
    T: FloatT,
{
    // Switch inequality row i into or out of the working set.  Values
    // change in both the unregularized KKT and the factors' copy; the
    // numeric factorization is deferred to the next solve.
    fn set_row_coupling(&mut self, i: usize, make_active: bool) {
        let rng = self.Bt.colptr[i]..self.Bt.colptr[i + 1];
        let index = &self.map.Bt[rng.clone()];
        let diag = [self.map.diag_full[self.n + self.me + i]];

        if make_active {
            let values = &self.Bt.nzval[rng];
            _update_values(&mut self.factors, &mut self.KKT, index, values);
            _update_values(&mut self.factors, &mut self.KKT, &diag, &[T::zero()]);
        } else {
            let zeros = vec![T::zero(); index.len()];
            _update_values(&mut self.factors, &mut self.KKT, index, &zeros);
            _update_values(&mut self.factors, &mut self.KKT, &diag, &[-T::one()]);
        }
        self.is_active[i] = make_active;
        self.is_stale = true;
    }

    fn regularize_and_refactor(&mut self) -> Result<(), KKTError> {
        let map = &self.map;
        let KKT = &self.KKT;
        let diag_shifted = &mut self.work2;
        let eps = self.reg.static_eps;

        // offset the true KKT diagonal, accounting for signs.  Only
        // the factors' copy is shifted.  KKT stays unregularized for
        // the refinement residuals.
        for ((shift, &idx), &sign) in zip(zip(&mut *diag_shifted, &map.diag_full), &self.dsigns) {
            *shift = KKT.nzval[idx];
            if sign == 1 {
                *shift += eps;
            } else {
                *shift -= eps;
            }
        }
        self.factors.update_values(&map.diag_full, diag_shifted);
        self.factors.set_regularize_enable(self.reg.dynamic);

        let result = self.factors.refactor();

        // restore the unshifted diagonal in the factors' copy so
        // that later edits see consistent values
        let diag_true: Vec<T> = map.diag_full.iter().map(|&idx| KKT.nzval[idx]).collect();
        self.factors.update_values(&map.diag_full, &diag_true);

        result?;
        if !self.factors.Dinv.is_finite() {
            return Err(KKTError::NonFinite);
        }
        self.is_stale = false;
        Ok(())
    }

    fn iterative_refinement(&mut self, settings: &CoreSettings<T>) {
        let (x, b) = (&mut self.x, &self.b);
        let (e, dx) = (&mut self.work1, &mut self.work2);

        // iterative refinement params
        let reltol = settings.iterative_refinement_reltol;
        let abstol = settings.iterative_refinement_abstol;
        let maxiter = settings.iterative_refinement_max_iter;
        let stopratio = settings.iterative_refinement_stop_ratio;

        let K = &self.KKT;
        let normb = b.norm_inf();

        //compute the initial error
        let mut norme = _get_refine_error(e, b, K, x);

        for _ in 0..maxiter {
            if !norme.is_finite() || norme <= (abstol + reltol * normb) {
                break;
            }

            let lastnorme = norme;

            //make a refinement.  dx = K \ e, then dx <- x + dx
            dx.copy_from(e);
            self.factors.solve(dx);
            dx.axpby(T::one(), x, T::one());
            norme = _get_refine_error(e, b, K, dx);

            let improved_ratio = lastnorme / norme;
            if improved_ratio > T::one() {
                //swap instead of copying to x
                std::mem::swap(x, dx);
            }
            if improved_ratio < stopratio {
                //insufficient improvement.  Exit
                break;
            }
        }
    }
}

//  computes e = b - Kξ, overwriting the first argument
//  and returning its norm

fn _get_refine_error<T: FloatT>(e: &mut [T], b: &[T], K: &CscMatrix<T>, ξ: &[T]) -> T {
    // Note that K is only triu data, so need to
    // be careful when computing the residual here
    e.copy_from(b);
    K.sym().symv(e, ξ, -T::one(), T::one()); //#  e = b - Kξ
    e.norm_inf()
}

// update entries of the KKT matrix using the given index into its CSC representation.
// applied to both the unpermuted matrix and to the permuted copy held by the factors
fn _update_values<T: FloatT>(
    factors: &mut QDLDLFactorisation<T>,
    KKT: &mut CscMatrix<T>,
    index: &[usize],
    values: &[T],
) {
    _update_values_KKT(KKT, index, values);
    factors.update_values(index, values);
}

fn _update_values_KKT<T: FloatT>(KKT: &mut CscMatrix<T>, index: &[usize], values: &[T]) {
    for (idx, v) in zip(index, values) {
        KKT.nzval[*idx] = *v;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn reg() -> RegularizationPolicy<f64> {
        RegularizationPolicy {
            static_eps: 1e-9,
            dynamic: false,
        }
    }

    #[test]
    fn test_working_set_solve() {
        // H = I, one equality x0 + x1 = 1, inequality rows x0 and x1
        let H = CscMatrix::<f64>::identity(2);
        let A = CscMatrix::from(&[[1., 1.]]);
        let B = CscMatrix::from(&[[1., 0.], [0., 1.]]);
        let settings = CoreSettings::<f64>::default();

        let mut kkt =
            DirectLDLKKTSolver::new(&H, &A.transpose(), &B.transpose(), &settings, &reg()).unwrap();
        kkt.refactor(&[], &reg()).unwrap();

        // min 0.5|x|^2 s.t. x0 + x1 = 1  ->  x = (0.5,0.5), y = -0.5
        let (mut x, mut y, mut l) = (vec![0.; 2], vec![0.; 1], vec![7.; 2]);
        kkt.setrhs(&[0., 0.], &[1.], &[5., 5.]);
        kkt.solve(&mut x, &mut y, &mut l, &settings).unwrap();
        assert!(x.norm_inf_diff(&[0.5, 0.5]) < 1e-10);
        assert!((y[0] + 0.5).abs() < 1e-10);
        assert_eq!(l, vec![0., 0.]);

        // x0 = 0.25 enters the working set
        kkt.edit(ActiveSetEdit::Add(0)).unwrap();
        kkt.setrhs(&[0., 0.], &[1.], &[0.25, 0.]);
        kkt.solve(&mut x, &mut y, &mut l, &settings).unwrap();
        assert!(x.norm_inf_diff(&[0.25, 0.75]) < 1e-10);
        // stationarity: x + A'y + B'l = 0
        assert!((x[1] + y[0]).abs() < 1e-10);
        assert!((x[0] + y[0] + l[0]).abs() < 1e-10);
        assert_eq!(l[1], 0.);

        // and leaves again
        kkt.edit(ActiveSetEdit::Drop(0)).unwrap();
        kkt.solve(&mut x, &mut y, &mut l, &settings).unwrap();
        assert!(x.norm_inf_diff(&[0.5, 0.5]) < 1e-10);
        assert_eq!(kkt.name(), "qdldl");
    }

    #[test]
    fn test_bad_edit_index() {
        let H = CscMatrix::<f64>::identity(1);
        let A = CscMatrix::<f64>::zeros((0, 1));
        let B = CscMatrix::from(&[[1.]]);
        let settings = CoreSettings::<f64>::default();
        let mut kkt =
            DirectLDLKKTSolver::new(&H, &A.transpose(), &B.transpose(), &settings, &reg()).unwrap();
        assert_eq!(kkt.edit(ActiveSetEdit::Add(3)), Err(KKTError::Dimension));
    }
}

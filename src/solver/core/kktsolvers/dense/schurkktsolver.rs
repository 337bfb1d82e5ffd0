#![allow(non_snake_case)]

use crate::algebra::*;
use crate::solver::core::kktsolvers::{ActiveSetEdit, KKTError, KKTSolver};
use crate::solver::core::{CoreSettings, RegularizationPolicy};

// -------------------------------------
// KKTSolver using dense range space factors
// -------------------------------------
//
// With H + eps*I = LL' and the working constraint rows C = [A; B_W],
// the columns of V = L^{-1}C' are kept together with an upper
// triangular R satisfying R'R = V'V.  Adding a row appends one column
// to V and R.  Dropping a row deletes a column and restores R with
// Givens rotations.  The Hessian factor is never touched by edits.

pub struct DenseKKTSolver<T> {
    me: usize,
    mi: usize,

    // full symmetric Hessian and its Cholesky factor
    H: Matrix<T>,
    chol: CholeskyEngine<T>,

    // constraint data, one column per row of A and B
    At: CscMatrix<T>,
    Bt: CscMatrix<T>,

    // V = L^{-1}C', equality columns first
    V: Matrix<T>,
    tri: UpdatableTriangle<T>,

    // inequality rows of the working set, in factor order
    order: Vec<usize>,

    // dynamic pivot parameters (eps, delta)
    dynamic_params: (T, T),

    // right hand side, and workspace
    rhsx: Vec<T>,
    rhsy: Vec<T>,
    rhsl: Vec<T>,
    workn: Vec<T>,
    workm: Vec<T>,
}

impl<T> DenseKKTSolver<T>
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

        let mut solver = Self {
            me,
            mi,
            H: _dense_symmetric(H),
            chol: CholeskyEngine::new(n),
            At: At.clone(),
            Bt: Bt.clone(),
            V: Matrix::zeros((n, me + mi)),
            tri: UpdatableTriangle::new(me + mi),
            order: Vec::with_capacity(mi),
            dynamic_params: (
                settings.dynamic_regularization_eps,
                settings.dynamic_regularization_delta,
            ),
            rhsx: vec![T::zero(); n],
            rhsy: vec![T::zero(); me],
            rhsl: vec![T::zero(); mi],
            workn: vec![T::zero(); n],
            workm: vec![T::zero(); me + mi],
        };
        solver.refactor(&[], reg)?;
        Ok(solver)
    }

    // Append the column v = L^{-1}c, where c is the given constraint row.
    fn append_row(&mut self, is_equality: bool, row: usize) -> Result<(), DenseFactorizationError> {
        let q = self.tri.dim;
        let v = &mut self.workn;
        if is_equality {
            self.At.col_to_dense(row, v);
        } else {
            self.Bt.col_to_dense(row, v);
        }
        self.chol.solve_lower(v);

        let r = &mut self.workm[0..q];
        for (j, rj) in r.iter_mut().enumerate() {
            *rj = self.V.col_slice(j).dot(v);
        }
        self.tri.solve_upper_t(r);

        let vv = v.sumsq();
        let rho2 = vv - r.sumsq();
        let tol = T::max(T::one(), vv) * (1e-12).as_T();
        self.tri.append(r, rho2, tol)?;
        self.V.col_slice_mut(q).copy_from(v);
        Ok(())
    }

    fn drop_row(&mut self, row: usize) {
        let Some(k) = self.order.iter().position(|&i| i == row) else {
            return;
        };
        let q = self.tri.dim;
        let col = self.me + k;
        self.tri.delete(col);

        // shift the trailing columns of V left by one
        let m = self.V.m;
        self.V.data.copy_within(((col + 1) * m)..(q * m), col * m);
        self.V.col_slice_mut(q - 1).fill(T::zero());
        self.order.remove(k);
    }
}

impl<T> KKTSolver<T> for DenseKKTSolver<T>
where
    T: FloatT,
{
    fn refactor(
        &mut self,
        active: &[usize],
        reg: &RegularizationPolicy<T>,
    ) -> Result<(), KKTError> {
        let dynamic = reg.dynamic.then_some(self.dynamic_params);
        self.chol
            .factor(&self.H, reg.static_eps, dynamic)
            .map_err(|_| KKTError::NotPositiveDefinite)?;

        self.tri.clear();
        self.V.data.fill(T::zero());
        self.order.clear();

        for k in 0..self.me {
            self.append_row(true, k)
                .map_err(|_| KKTError::DependentEquality(k))?;
        }
        for &i in active {
            self.edit(ActiveSetEdit::Add(i))?;
        }
        Ok(())
    }

    fn edit(&mut self, edit: ActiveSetEdit) -> Result<(), KKTError> {
        let i = edit.index();
        if i >= self.mi {
            return Err(KKTError::Dimension);
        }
        match edit {
            ActiveSetEdit::Add(i) => {
                if !self.order.contains(&i) {
                    self.append_row(false, i)
                        .map_err(|_| KKTError::DependentConstraint(i))?;
                    self.order.push(i);
                }
            }
            ActiveSetEdit::Drop(i) => self.drop_row(i),
        }
        Ok(())
    }

    fn setrhs(&mut self, rhsx: &[T], rhsy: &[T], rhsl: &[T]) {
        self.rhsx.copy_from(rhsx);
        self.rhsy.copy_from(rhsy);
        self.rhsl.copy_from(rhsl);
    }

    fn solve(
        &mut self,
        lhsx: &mut [T],
        lhsy: &mut [T],
        lhsl: &mut [T],
        _settings: &CoreSettings<T>,
    ) -> Result<(), KKTError> {
        let q = self.tri.dim;
        let me = self.me;

        // h = L^{-1} rhsx
        let h = &mut self.workn;
        h.copy_from(&self.rhsx);
        self.chol.solve_lower(h);

        // R'R w = V'h - c
        let w = &mut self.workm[0..q];
        for (j, wj) in w.iter_mut().enumerate() {
            let c = if j < me {
                self.rhsy[j]
            } else {
                self.rhsl[self.order[j - me]]
            };
            *wj = self.V.col_slice(j).dot(h) - c;
        }
        self.tri.solve_upper_t(w);
        self.tri.solve_upper(w);

        // x = L^{-T}(h - Vw)
        for (j, &wj) in w.iter().enumerate() {
            h.axpby(-wj, self.V.col_slice(j), T::one());
        }
        self.chol.solve_lower_t(h);

        if !h.is_finite() || !w.is_finite() {
            return Err(KKTError::NonFinite);
        }

        lhsx.copy_from(h);
        lhsy.copy_from(&w[0..me]);
        lhsl.fill(T::zero());
        for (k, &i) in self.order.iter().enumerate() {
            lhsl[i] = w[me + k];
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dense"
    }
}

// expand triu CSC data to a full dense symmetric matrix
fn _dense_symmetric<T: FloatT>(H: &CscMatrix<T>) -> Matrix<T> {
    let mut M = Matrix::zeros((H.n, H.n));
    for col in 0..H.n {
        for idx in H.colptr[col]..H.colptr[col + 1] {
            let row = H.rowval[idx];
            M[(row, col)] = H.nzval[idx];
            M[(col, row)] = H.nzval[idx];
        }
    }
    M
}

#[cfg(test)]
mod test {
    use super::*;

    fn reg() -> RegularizationPolicy<f64> {
        RegularizationPolicy {
            static_eps: 0.,
            dynamic: false,
        }
    }

    fn solver() -> DenseKKTSolver<f64> {
        // H = diag(1,2,4), x0 + x1 + x2 = 1, inequality rows x0, x1, x0 + x1
        let H = CscMatrix::from(&[
            [1., 0., 0.], //
            [0., 2., 0.], //
            [0., 0., 4.], //
        ]);
        let A = CscMatrix::from(&[[1., 1., 1.]]);
        let B = CscMatrix::from(&[
            [1., 0., 0.], //
            [0., 1., 0.], //
            [1., 1., 0.], //
        ]);
        let settings = CoreSettings::<f64>::default();
        DenseKKTSolver::new(&H, &A.transpose(), &B.transpose(), &settings, &reg()).unwrap()
    }

    #[test]
    fn test_equality_only_solve() {
        let mut kkt = solver();
        let (mut x, mut y, mut l) = (vec![0.; 3], vec![0.; 1], vec![9.; 3]);
        kkt.setrhs(&[0., 0., 0.], &[1.], &[0., 0., 0.]);
        kkt.solve(&mut x, &mut y, &mut l, &CoreSettings::default()).unwrap();

        // x = -H^{-1}A'y with sum(x) = 1  ->  y = -4/7
        assert!(x.norm_inf_diff(&[4. / 7., 2. / 7., 1. / 7.]) < 1e-12);
        assert!((y[0] + 4. / 7.).abs() < 1e-12);
        assert_eq!(l, vec![0., 0., 0.]);
    }

    #[test]
    fn test_add_and_drop() {
        let mut kkt = solver();
        let settings = CoreSettings::default();
        let (mut x, mut y, mut l) = (vec![0.; 3], vec![0.; 1], vec![0.; 3]);

        kkt.edit(ActiveSetEdit::Add(1)).unwrap();
        kkt.edit(ActiveSetEdit::Add(0)).unwrap();
        kkt.setrhs(&[0., 0., 0.], &[1.], &[0.5, 0.25, 0.]);
        kkt.solve(&mut x, &mut y, &mut l, &settings).unwrap();
        assert!(x.norm_inf_diff(&[0.5, 0.25, 0.25]) < 1e-12);
        // stationarity Hx + A'y + B'l = 0
        assert!((4. * 0.25 + y[0]).abs() < 1e-12);
        assert!((0.5 + y[0] + l[0]).abs() < 1e-12);
        assert!((0.5 + y[0] + l[1]).abs() < 1e-12);
        assert_eq!(l[2], 0.);

        // x0 + x1 is dependent on rows 0 and 1 and the equality
        assert_eq!(
            kkt.edit(ActiveSetEdit::Add(2)),
            Err(KKTError::DependentConstraint(2))
        );

        // drop the first added row.  Only x0 = 0.5 remains
        kkt.edit(ActiveSetEdit::Drop(1)).unwrap();
        kkt.solve(&mut x, &mut y, &mut l, &settings).unwrap();
        // 2x1 = 4x2 and x1 + x2 = 0.5
        assert!(x.norm_inf_diff(&[0.5, 1. / 3., 1. / 6.]) < 1e-12);
        assert_eq!(l[1], 0.);
        assert_eq!(kkt.name(), "dense");
    }

    #[test]
    fn test_refactor_matches_edits() {
        let mut a = solver();
        let mut b = solver();
        let settings = CoreSettings::default();
        a.edit(ActiveSetEdit::Add(0)).unwrap();
        b.refactor(&[0], &reg()).unwrap();

        let rhs = ([1., -1., 0.5], [0.3], [0.2, 0., 0.]);
        let (mut xa, mut ya, mut la) = (vec![0.; 3], vec![0.; 1], vec![0.; 3]);
        let (mut xb, mut yb, mut lb) = (vec![0.; 3], vec![0.; 1], vec![0.; 3]);
        a.setrhs(&rhs.0, &rhs.1, &rhs.2);
        b.setrhs(&rhs.0, &rhs.1, &rhs.2);
        a.solve(&mut xa, &mut ya, &mut la, &settings).unwrap();
        b.solve(&mut xb, &mut yb, &mut lb, &settings).unwrap();
        assert!(xa.norm_inf_diff(&xb) < 1e-12);
        assert!(la.norm_inf_diff(&lb) < 1e-12);
    }

    #[test]
    fn test_indefinite_hessian() {
        let H = CscMatrix::from(&[[0.]]);
        let A = CscMatrix::<f64>::zeros((0, 1));
        let B = CscMatrix::<f64>::zeros((0, 1));
        let settings = CoreSettings::<f64>::default();
        let out = DenseKKTSolver::new(&H, &A.transpose(), &B.transpose(), &settings, &reg());
        assert!(matches!(out, Err(KKTError::NotPositiveDefinite)));

        // dynamic regularization replaces the zero pivot
        let dynamic = RegularizationPolicy {
            static_eps: 0.,
            dynamic: true,
        };
        assert!(DenseKKTSolver::new(&H, &A.transpose(), &B.transpose(), &settings, &dynamic).is_ok());
    }
}

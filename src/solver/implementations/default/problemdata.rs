#![allow(non_snake_case)]
use super::*;
use crate::solver::core::traits::ProblemData;
use crate::solver::utils::PositionAll;
use crate::{algebra::*, solver::get_infinity};

// ---------------
// Data type for default problem format
// ---------------

/// Standard-form solver type implementing the [`ProblemData`](crate::solver::core::traits::ProblemData) trait
///
/// Constraint matrices are held transposed, so that the rows of `A`
/// and `B` are the columns of `At` and `Bt`.
pub struct DefaultProblemData<T> {
    // the main KKT residuals
    pub H: CscMatrix<T>,
    pub q: Vec<T>,
    pub At: CscMatrix<T>,
    pub a: Vec<T>,
    pub Bt: CscMatrix<T>,
    pub b: Vec<T>,
    pub n: usize,
    pub me: usize,
    pub mi: usize,

    /// inequality rows with a bound below the infinity threshold
    pub finite_rows: Vec<usize>,
    finite_mask: Vec<bool>,

    pub equilibration: DefaultEquilibrationData<T>,
    scaled: bool,
}

impl<T> DefaultProblemData<T>
where
    T: FloatT,
{
    pub fn new(
        H: &CscMatrix<T>,
        q: &[T],
        A: &CscMatrix<T>,
        a: &[T],
        B: &CscMatrix<T>,
        b: &[T],
    ) -> Self {
        let (n, me, mi) = (H.n, A.m, B.m);

        let infbound = get_infinity().as_T();
        let finite_rows = b.iter().position_all(|&bi| *bi < infbound);
        let mut finite_mask = vec![false; mi];
        for &i in finite_rows.iter() {
            finite_mask[i] = true;
        }

        Self {
            H: H.clone(),
            q: q.to_vec(),
            At: A.transpose(),
            a: a.to_vec(),
            Bt: B.transpose(),
            b: b.to_vec(),
            n,
            me,
            mi,
            finite_rows,
            finite_mask,
            equilibration: DefaultEquilibrationData::<T>::new(n, me, mi),
            scaled: false,
        }
    }

    // modified Ruiz equilibration of the full KKT matrix
    fn equilibrate_ruiz(&mut self, passes: u32, settings: &DefaultSettings<T>) {
        let (n, me, mi) = (self.n, self.me, self.mi);
        let equil = &mut self.equilibration;

        let scale_min = settings.equilibrate_min_scaling;
        let scale_max = settings.equilibrate_max_scaling;

        let mut dwork = vec![T::zero(); n];
        let mut eawork = vec![T::zero(); me];
        let mut ebwork = vec![T::zero(); mi];

        // references to problem data
        // note that H is triu, but it shouldn't matter
        let (H, At, Bt) = (&mut self.H, &mut self.At, &mut self.Bt);
        let (q, a, b) = (&mut self.q, &mut self.a, &mut self.b);

        // perform scaling operations for a fixed number of steps
        for _ in 0..passes {
            kkt_col_norms(H, At, Bt, &mut dwork, &mut eawork, &mut ebwork);

            dwork.scalarop(|x| limit_scaling(x, scale_min, scale_max));
            eawork.scalarop(|x| limit_scaling(x, scale_min, scale_max));
            ebwork.scalarop(|x| limit_scaling(x, scale_min, scale_max));

            dwork.rsqrt();
            eawork.rsqrt();
            ebwork.rsqrt();

            // rows without a bound keep their scale
            for (e, &finite) in ebwork.iter_mut().zip(&self.finite_mask) {
                if !finite {
                    *e = T::one();
                }
            }

            // Scale the problem data and update the
            // equilibration matrices
            scale_data(H, At, Bt, q, a, b, &dwork, &eawork, &ebwork, &self.finite_rows);
            equil.d.hadamard(&dwork);
            equil.ea.hadamard(&eawork);
            equil.eb.hadamard(&ebwork);

            // now use the dwork array to hold the
            // column norms of the newly scaled H
            // so that we can compute the mean
            H.col_norms_sym(&mut dwork);
            let mean_col_norm_H = dwork.mean();
            let inf_norm_q = q.norm_inf();

            if mean_col_norm_H != T::zero() && inf_norm_q != T::zero() {
                let scale_cost = T::max(inf_norm_q, mean_col_norm_H);
                let scale_cost = limit_scaling(scale_cost, scale_min, scale_max);
                let ctmp = T::recip(scale_cost);

                // scale the penalty terms and overall scaling
                H.scale(ctmp);
                q.scale(ctmp);
                equil.c *= ctmp;
            }
        } //end Ruiz scaling loop

        equil.update_inverses();
    }

    // Hessian diagonal scaling of the variables, then
    // unit infinity norm for every constraint row
    fn equilibrate_diagonal(&mut self, settings: &DefaultSettings<T>) {
        let equil = &mut self.equilibration;
        let scale_min = settings.equilibrate_min_scaling;
        let scale_max = settings.equilibrate_max_scaling;
        let limited_recip = |s: T| T::recip(limit_scaling(s, scale_min, scale_max));

        for (j, dj) in equil.d.iter_mut().enumerate() {
            let hjj = self.H.get_entry((j, j)).unwrap_or_else(T::zero);
            *dj = limited_recip(hjj).sqrt();
        }
        let d = &equil.d;
        self.H.lrscale(d, d);
        self.At.lscale(d);
        self.Bt.lscale(d);
        self.q.hadamard(d);

        self.At.col_norms(&mut equil.ea);
        self.Bt.col_norms(&mut equil.eb);
        equil.ea.scalarop(limited_recip);
        for (e, &finite) in equil.eb.iter_mut().zip(&self.finite_mask) {
            *e = if finite { limited_recip(*e) } else { T::one() };
        }

        self.At.rscale(&equil.ea);
        self.Bt.rscale(&equil.eb);
        self.a.hadamard(&equil.ea);
        scale_bounds(&mut self.b, &equil.eb, &self.finite_rows);

        equil.c = T::one();
        equil.update_inverses();
    }
}

impl<T> ProblemData<T> for DefaultProblemData<T>
where
    T: FloatT,
{
    type V = DefaultVariables<T>;
    type SE = DefaultSettings<T>;

    fn scale(&mut self, settings: &DefaultSettings<T>) {
        if self.scaled {
            return;
        }
        match settings.scaling {
            0 => return,
            s if s > 0 => self.equilibrate_ruiz(s as u32, settings),
            _ => self.equilibrate_diagonal(settings),
        }
        self.scaled = true;
    }

    fn unscale(&mut self, variables: &mut DefaultVariables<T>) {
        if !self.scaled {
            return;
        }
        let equil = &mut self.equilibration;
        let cinv = T::recip(equil.c);

        // data
        self.H.lrscale(&equil.dinv, &equil.dinv);
        self.H.scale(cinv);
        self.q.hadamard(&equil.dinv).scale(cinv);
        self.At.lrscale(&equil.dinv, &equil.eainv);
        self.a.hadamard(&equil.eainv);
        self.Bt.lrscale(&equil.dinv, &equil.ebinv);
        scale_bounds(&mut self.b, &equil.ebinv, &self.finite_rows);

        // variables
        variables.x.hadamard(&equil.d);
        variables.y.hadamard(&equil.ea).scale(cinv);
        variables.lambda.hadamard(&equil.eb).scale(cinv);

        equil.reset();
        self.scaled = false;
    }

    fn is_scaled(&self) -> bool {
        self.scaled
    }

    fn is_finite_row(&self, i: usize) -> bool {
        self.finite_mask.get(i).copied().unwrap_or(false)
    }

    fn equality_residual(&self, variables: &DefaultVariables<T>) -> T {
        let mut r = self.a.clone();
        self.At.t().gemv(&mut r, &variables.x, T::one(), -T::one());
        r.norm_inf()
    }
}

// ---------------
// utilities
// ---------------

fn kkt_col_norms<T: FloatT>(
    H: &CscMatrix<T>,
    At: &CscMatrix<T>,
    Bt: &CscMatrix<T>,
    norm_x: &mut [T],
    norm_a: &mut [T],
    norm_b: &mut [T],
) {
    H.col_norms_sym(norm_x); // H is triu
    At.row_norms_no_reset(norm_x); // incrementally from H norms
    Bt.row_norms_no_reset(norm_x);
    At.col_norms(norm_a); // same as row norms of A
    Bt.col_norms(norm_b);
}

fn limit_scaling<T>(s: T, minval: T, maxval: T) -> T
where
    T: FloatT + ScalarMath<T = T>,
{
    s.clip(minval, maxval, T::one(), maxval)
}

#[allow(clippy::too_many_arguments)]
fn scale_data<T: FloatT>(
    H: &mut CscMatrix<T>,
    At: &mut CscMatrix<T>,
    Bt: &mut CscMatrix<T>,
    q: &mut [T],
    a: &mut [T],
    b: &mut [T],
    d: &[T],
    ea: &[T],
    eb: &[T],
    finite_rows: &[usize],
) {
    H.lrscale(d, d); // H[:,:] = Ds*H*Ds
    At.lrscale(d, ea); // At[:,:] = Ds*At*Eas
    Bt.lrscale(d, eb); // Bt[:,:] = Ds*Bt*Ebs
    q.hadamard(d);
    a.hadamard(ea);
    scale_bounds(b, eb, finite_rows);
}

// rows without a finite bound are never rescaled
fn scale_bounds<T: FloatT>(b: &mut [T], e: &[T], finite_rows: &[usize]) {
    for &i in finite_rows {
        b[i] *= e[i];
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn data() -> DefaultProblemData<f64> {
        let H = CscMatrix::from(&[
            [4., 1.], //
            [0., 9.], //
        ]);
        let A = CscMatrix::from(&[[2., 1.]]);
        let B = CscMatrix::from(&[
            [1., -3.], //
            [0., 1.],  //
        ]);
        DefaultProblemData::new(&H, &[1., -2.], &A, &[3.], &B, &[5., 1e30])
    }

    #[test]
    fn test_infinite_rows() {
        let data = data();
        assert_eq!(data.finite_rows, vec![0]);
        assert!(data.is_finite_row(0));
        assert!(!data.is_finite_row(1));
        assert!(!data.is_finite_row(7));
    }

    #[test]
    fn test_diagonal_scaling() {
        let mut data = data();
        let settings = DefaultSettingsBuilder::default().scaling(-1).build().unwrap();
        data.scale(&settings);
        assert!(data.is_scaled());

        // unit Hessian diagonal and unit row norms
        assert!((data.H.get_entry((0, 0)).unwrap() - 1.).abs() < 1e-14);
        assert!((data.H.get_entry((1, 1)).unwrap() - 1.).abs() < 1e-14);
        let mut norms = vec![0.; 1];
        data.At.col_norms(&mut norms);
        assert!((norms[0] - 1.).abs() < 1e-14);

        // the unbounded row keeps its bound
        assert_eq!(data.b[1], 1e30);
        assert_eq!(data.equilibration.c, 1.);

        // scaling twice has no effect
        let H = data.H.clone();
        data.scale(&settings);
        assert_eq!(data.H, H);
    }

    #[test]
    fn test_scaling_round_trip() {
        for scaling in [-1, 3] {
            let original = data();
            let mut data = data();
            let settings = DefaultSettingsBuilder::default()
                .scaling(scaling)
                .build()
                .unwrap();
            data.scale(&settings);
            let mut vars = DefaultVariables::<f64>::new(2, 1, 2);
            data.unscale(&mut vars);
            assert!(!data.is_scaled());

            assert!(data.H.nzval.norm_inf_diff(&original.H.nzval) < 1e-12);
            assert!(data.At.nzval.norm_inf_diff(&original.At.nzval) < 1e-12);
            assert!(data.Bt.nzval.norm_inf_diff(&original.Bt.nzval) < 1e-12);
            assert!(data.q.norm_inf_diff(&original.q) < 1e-12);
            assert!(data.a.norm_inf_diff(&original.a) < 1e-12);
            assert!((data.b[0] - original.b[0]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_unbounded_rows_never_scaled() {
        let H = CscMatrix::from(&[
            [4., 1.], //
            [0., 9.], //
        ]);
        let A = CscMatrix::from(&[[2., 1.]]);
        let B = CscMatrix::from(&[
            [1., -3.], //
            [0., 100.], //
        ]);
        let b = [5., f64::INFINITY];

        for scaling in [-1, 3] {
            let mut data = DefaultProblemData::new(&H, &[1., -2.], &A, &[3.], &B, &b);
            let settings = DefaultSettingsBuilder::default()
                .scaling(scaling)
                .build()
                .unwrap();
            data.scale(&settings);
            assert_eq!(data.b[1], f64::INFINITY);
            assert_eq!(data.equilibration.eb[1], 1.);
            assert!(data.b[0].is_finite());

            let mut vars = DefaultVariables::<f64>::new(2, 1, 2);
            data.unscale(&mut vars);
            assert_eq!(data.b[1], f64::INFINITY);
            assert!((data.b[0] - 5.).abs() < 1e-12);
        }
    }
}

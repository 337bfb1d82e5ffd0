use super::{AsFloatT, FloatT, VectorMath};
use std::iter::zip;

impl<T: FloatT> VectorMath for [T] {
    type T = T;
    fn copy_from(&mut self, src: &[T]) -> &mut Self {
        self.copy_from_slice(src);
        self
    }

    fn scalarop(&mut self, op: impl Fn(T) -> T) -> &mut Self {
        for x in &mut *self {
            *x = op(*x);
        }
        self
    }

    fn set(&mut self, c: T) -> &mut Self {
        self.fill(c);
        self
    }

    fn scale(&mut self, c: T) -> &mut Self {
        self.scalarop(|x| x * c)
    }

    fn recip(&mut self) -> &mut Self {
        self.scalarop(T::recip)
    }

    fn sqrt(&mut self) -> &mut Self {
        self.scalarop(T::sqrt)
    }

    fn rsqrt(&mut self) -> &mut Self {
        self.scalarop(|x| T::recip(T::sqrt(x)))
    }

    fn negate(&mut self) -> &mut Self {
        self.scalarop(|x| -x)
    }

    fn hadamard(&mut self, y: &[T]) -> &mut Self {
        zip(&mut *self, y).for_each(|(x, y)| *x *= *y);
        self
    }

    fn dot(&self, y: &[T]) -> T {
        assert_eq!(self.len(), y.len());
        accumulate_pairwise(self.len(), &|i| self[i] * y[i])
    }

    fn sum(&self) -> T {
        accumulate_pairwise(self.len(), &|i| self[i])
    }

    fn sumsq(&self) -> T {
        self.dot(self)
    }

    // Returns infinity norm, or NaN if any element is NaN
    fn norm_inf(&self) -> T {
        let mut out = T::zero();
        for v in self.iter().map(|v| v.abs()) {
            if v.is_nan() {
                return T::nan();
            }
            out = if v > out { v } else { out };
        }
        out
    }

    fn norm_inf_diff(&self, b: &[T]) -> T {
        zip(self, b).fold(T::zero(), |acc, (x, y)| T::max(acc, T::abs(*x - *y)))
    }

    fn minimum(&self) -> T {
        self.iter().fold(T::infinity(), |r, &s| T::min(r, s))
    }

    fn maximum(&self) -> T {
        self.iter().fold(-T::infinity(), |r, &s| T::max(r, s))
    }

    fn mean(&self) -> T {
        if self.is_empty() {
            T::zero()
        } else {
            self.sum() / self.len().as_T()
        }
    }

    fn is_finite(&self) -> bool {
        self.iter().all(|&x| T::is_finite(x))
    }

    fn axpby(&mut self, a: T, x: &[T], b: T) -> &mut Self {
        assert_eq!(self.len(), x.len());

        zip(&mut *self, x).for_each(|(y, x)| *y = a * (*x) + b * (*y));
        self
    }
}

// ---------------------------------------------------------------------
// pairwise summation of op(i) over 0..n.  Splits in half until blocks
// are short enough for a plain fold.

fn accumulate_pairwise<T, F>(n: usize, op: &F) -> T
where
    T: FloatT,
    F: Fn(usize) -> T,
{
    const BASE_CASE_DIM: usize = 32;

    return inner(op, 0, n);

    fn inner<T: FloatT, F: Fn(usize) -> T>(op: &F, start: usize, len: usize) -> T {
        if len < BASE_CASE_DIM {
            (start..start + len).fold(T::zero(), |acc, i| acc + op(i))
        } else {
            let half = len / 2;
            inner(op, start, half) + inner(op, start + half, len - half)
        }
    }
}

#[test]
fn test_dot_product() {
    let x = vec![1., 2., 3., 4.];
    let y = vec![4., 5., 6., 7.];
    assert_eq!(x.dot(&y), 60.);
}

#[test]
fn test_mean() {
    let x = vec![1., 2., 3., 4., 5.];
    assert_eq!(x.mean(), 3.);
    assert_eq!(x[0..1].mean(), 1.);
    assert_eq!(x[0..0].mean(), 0.);

    //naive summation of many f32s drifts badly,
    //but the pairwise method should not
    let n = 10000000usize;
    let x = vec![1.5f32; n];
    assert_eq!(x.mean(), 1.5f32);
}

#[test]
fn test_sum_matches_fold_on_integers() {
    let maxlen = 128 * 7 + 1;
    let x: Vec<f64> = (1..=maxlen).map(|x| x as f64).collect();

    for i in 0..=x.len() {
        let z = &x[0..i];
        let sum1 = z.iter().fold(0.0, |acc, &z| acc + z);
        assert_eq!(sum1, z.sum());
    }
}

#[test]
fn test_norms() {
    let x = [3., -4., 0.];
    assert_eq!(x.sumsq(), 25.);
    assert_eq!(x.norm_inf(), 4.);
    assert_eq!(x.minimum(), -4.);
    assert_eq!(x.maximum(), 3.);
    assert!([1., f64::NAN].norm_inf().is_nan());
    assert_eq!(x.norm_inf_diff(&[3., -3., 1.]), 1.);
}

#[test]
fn test_axpby() {
    let mut y = vec![1., 2., 3.];
    y.axpby(2., &[1., 1., 1.], -1.);
    assert_eq!(y, vec![1., 0., -1.]);
}

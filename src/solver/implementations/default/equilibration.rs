#![allow(non_snake_case)]
use crate::algebra::*;

// ---------------
// equilibration data
// ---------------

/// Diagonal scaling applied to the problem data.
///
/// The scaled problem has data `cDHD`, `cDq`, `E_a A D`, `E_a a`,
/// `E_b B D` and `E_b b`, where `D`, `E_a` and `E_b` are diagonal.
pub struct DefaultEquilibrationData<T> {
    /// Vector of variable scaling terms
    pub d: Vec<T>,
    /// Vector of inverse variable scaling terms
    pub dinv: Vec<T>,
    /// Vector of equality constraint scaling terms
    pub ea: Vec<T>,
    /// Vector of inverse equality constraint scaling terms
    pub eainv: Vec<T>,
    /// Vector of inequality constraint scaling terms
    pub eb: Vec<T>,
    /// Vector of inverse inequality constraint scaling terms
    pub ebinv: Vec<T>,
    /// overall scaling for objective function
    pub c: T,
}

impl<T> DefaultEquilibrationData<T>
where
    T: FloatT,
{
    /// creates a new (identity) equilibration object
    pub fn new(n: usize, me: usize, mi: usize) -> Self {
        Self {
            d: vec![T::one(); n],
            dinv: vec![T::one(); n],
            ea: vec![T::one(); me],
            eainv: vec![T::one(); me],
            eb: vec![T::one(); mi],
            ebinv: vec![T::one(); mi],
            c: T::one(),
        }
    }

    /// reset to the identity scaling
    pub fn reset(&mut self) {
        self.d.set(T::one());
        self.dinv.set(T::one());
        self.ea.set(T::one());
        self.eainv.set(T::one());
        self.eb.set(T::one());
        self.ebinv.set(T::one());
        self.c = T::one();
    }

    /// update the inverse scaling data
    pub(crate) fn update_inverses(&mut self) {
        _recip_into(&mut self.dinv, &self.d);
        _recip_into(&mut self.eainv, &self.ea);
        _recip_into(&mut self.ebinv, &self.eb);
    }
}

fn _recip_into<T: FloatT>(inv: &mut [T], v: &[T]) {
    inv.copy_from(v).recip();
}

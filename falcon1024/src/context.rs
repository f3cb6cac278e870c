use core::fmt;

use num_complex::Complex64;

use crate::{
    SIGMA,
    error::FalconError,
    math::{FalconFelt, FastFft, Polynomial, ffsampling::LdlTree, ntt},
};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Per-key signing context: everything the sampler needs, derived once from the short basis.
///
/// B0 = [[g, -f], [G, -F]] is kept in FFT form for target computation and recombination; the
/// normalized LDL tree drives the fast-Fourier sampler; h = g/f mod q is the public key.
/// The context is immutable after construction and wipes its secret-derived parts on drop.
pub(crate) struct FalconContext {
    pub b0_fft: [Polynomial<Complex64>; 4],
    pub tree: LdlTree,
    pub h: Polynomial<FalconFelt>,
}

impl FalconContext {
    /// Builds the context from the basis [f, g, F, G], or fails if f is not invertible mod q.
    pub fn new(basis: &[Polynomial<i16>; 4]) -> Result<Self, FalconError> {
        let [f, g, big_f, big_g] = basis;

        let h = ntt::div_zq(&Polynomial::<FalconFelt>::from(g), &Polynomial::<FalconFelt>::from(f))
            .ok_or(FalconError::NotInvertible)?;

        let b0 = [g.clone(), -f, big_g.clone(), -big_f];
        let b0_fft = b0.map(|p| p.to_complex().fft());
        let tree = LdlTree::new(&b0_fft, SIGMA);

        Ok(Self { b0_fft, tree, h })
    }
}

impl fmt::Debug for FalconContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FalconContext").finish_non_exhaustive()
    }
}

impl Zeroize for FalconContext {
    fn zeroize(&mut self) {
        for polynomial in self.b0_fft.iter_mut() {
            for coefficient in polynomial.coefficients.iter_mut() {
                unsafe {
                    core::ptr::write_volatile(coefficient, Complex64::new(0.0, 0.0));
                }
            }
        }
        self.tree.zeroize();
        core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
    }
}

impl Drop for FalconContext {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for FalconContext {}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::{FalconContext, FalconError, Polynomial};
    use crate::math::FalconFelt;

    fn constant(value: i16, n: usize) -> Polynomial<i16> {
        let mut coefficients = vec![0i16; n];
        coefficients[0] = value;
        Polynomial::new(coefficients)
    }

    #[test]
    fn trivial_basis_yields_h_equal_to_g() {
        let n = 16;
        // f = 1, g = x, F = 0, G = q satisfy f·G − g·F = q.
        let f = constant(1, n);
        let mut g = constant(0, n);
        g.coefficients[1] = 1;
        let big_f = constant(0, n);
        let big_g = constant(crate::MODULUS, n);

        let context = FalconContext::new(&[f, g.clone(), big_f, big_g]).unwrap();
        assert_eq!(context.h, Polynomial::<FalconFelt>::from(&g));
        assert_eq!(context.b0_fft[0].coefficients.len(), n);
    }

    #[test]
    fn non_invertible_f_is_rejected() {
        let n = 16;
        let basis =
            [constant(0, n), constant(1, n), constant(0, n), constant(crate::MODULUS, n)];
        assert_matches!(FalconContext::new(&basis), Err(FalconError::NotInvertible));
    }

    #[test]
    fn debug_output_is_redacted() {
        let n = 16;
        let mut g = constant(0, n);
        g.coefficients[1] = 1;
        let context =
            FalconContext::new(&[constant(1, n), g, constant(0, n), constant(crate::MODULUS, n)])
                .unwrap();
        assert_eq!(format!("{context:?}"), "FalconContext { .. }");
    }
}

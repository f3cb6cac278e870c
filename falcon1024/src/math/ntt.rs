//! Negacyclic number-theoretic transform modulo q = 12289.
//!
//! q - 1 = 2^12 * 3, so Z/qZ contains 2048-th roots of unity and the ring Z_q[x]/(x^n + 1)
//! splits completely for every power of two n up to 1024. Polynomial multiplication and
//! division reduce to coefficient-wise operations on the transformed vectors.

use alloc::vec::Vec;

use num::{One, Zero};

use super::{Inverse, field::FalconFelt, polynomial::Polynomial};

// PSI = 1945 is a primitive 2048-th root of unity mod q. Its odd powers are the roots of
// x^1024 + 1, so the transform with twists by PSI is negacyclic rather than cyclic.
const PSI: u16 = 1945;

/// Reverses the lowest `bits` bits of `value`.
fn bit_reverse(value: usize, bits: usize) -> usize {
    value.reverse_bits() >> (usize::BITS as usize - bits)
}

/// Builds the bit-reversed twiddle tables for a transform of length n: powers of the primitive
/// 2n-th root of unity (forward) and of its inverse (backward), in bit-reversed order as the
/// butterfly schedules below consume them.
fn psi_tables(n: usize) -> (Vec<FalconFelt>, Vec<FalconFelt>) {
    debug_assert!(n.is_power_of_two() && 2 <= n && n <= 1024);
    let logn = n.trailing_zeros() as usize;
    let psi_n = FalconFelt::new(PSI).pow((1024 / n) as u32);
    let psi_n_inv = psi_n.inverse_or_zero();

    let mut forward_powers = Vec::with_capacity(n);
    let mut inverse_powers = Vec::with_capacity(n);
    let mut fwd = FalconFelt::one();
    let mut inv = FalconFelt::one();
    for _ in 0..n {
        forward_powers.push(fwd);
        inverse_powers.push(inv);
        fwd *= psi_n;
        inv *= psi_n_inv;
    }

    let psi_rev = (0..n).map(|i| forward_powers[bit_reverse(i, logn)]).collect();
    let psi_inv_rev = (0..n).map(|i| inverse_powers[bit_reverse(i, logn)]).collect();
    (psi_rev, psi_inv_rev)
}

/// Computes the negacyclic NTT: evaluations of the polynomial at the odd powers of the
/// primitive 2n-th root of unity. Cooley-Tukey butterflies, in-place on a copy.
pub fn ntt(polynomial: &Polynomial<FalconFelt>) -> Vec<FalconFelt> {
    let mut a = polynomial.coefficients.clone();
    let n = a.len();
    let (psi_rev, _) = psi_tables(n);

    let mut t = n;
    let mut m = 1;
    while m < n {
        t /= 2;
        for i in 0..m {
            let j1 = 2 * i * t;
            let s = psi_rev[m + i];
            for j in j1..j1 + t {
                let u = a[j];
                let v = a[j + t] * s;
                a[j] = u + v;
                a[j + t] = u - v;
            }
        }
        m *= 2;
    }
    a
}

/// Inverts the negacyclic NTT. Gentleman-Sande butterflies followed by scaling with 1/n.
pub fn intt(values: &[FalconFelt]) -> Polynomial<FalconFelt> {
    let mut a = values.to_vec();
    let n = a.len();
    let (_, psi_inv_rev) = psi_tables(n);

    let mut t = 1;
    let mut m = n;
    while m > 1 {
        let h = m / 2;
        let mut j1 = 0;
        for i in 0..h {
            let s = psi_inv_rev[h + i];
            for j in j1..j1 + t {
                let u = a[j];
                let v = a[j + t];
                a[j] = u + v;
                a[j + t] = (u - v) * s;
            }
            j1 += 2 * t;
        }
        t *= 2;
        m = h;
    }

    let n_inv = FalconFelt::new(n as u16).inverse_or_zero();
    for c in a.iter_mut() {
        *c *= n_inv;
    }
    Polynomial::new(a)
}

/// Multiplies two polynomials in Z_q[x]/(x^n + 1).
pub fn mul_zq(a: &Polynomial<FalconFelt>, b: &Polynomial<FalconFelt>) -> Polynomial<FalconFelt> {
    debug_assert_eq!(a.coefficients.len(), b.coefficients.len());
    let a_hat = ntt(a);
    let b_hat = ntt(b);
    let product: Vec<FalconFelt> =
        a_hat.into_iter().zip(b_hat.into_iter()).map(|(x, y)| x * y).collect();
    intt(&product)
}

/// Divides two polynomials in Z_q[x]/(x^n + 1), or returns `None` if the divisor is not
/// invertible, i.e. has a zero somewhere in the NTT domain.
pub fn div_zq(
    a: &Polynomial<FalconFelt>,
    b: &Polynomial<FalconFelt>,
) -> Option<Polynomial<FalconFelt>> {
    debug_assert_eq!(a.coefficients.len(), b.coefficients.len());
    let b_hat = ntt(b);
    if b_hat.iter().any(|c| c.is_zero()) {
        return None;
    }
    let a_hat = ntt(a);
    let quotient: Vec<FalconFelt> =
        a_hat.into_iter().zip(b_hat.iter()).map(|(x, y)| x * y.inverse_or_zero()).collect();
    Some(intt(&quotient))
}

// TESTS
// ================================================================================================

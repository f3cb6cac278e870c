//! Fast Fourier transform over the complex roots of x^n + 1.
//!
//! The transform evaluates a polynomial at the 2n-th primitive roots of unity, i.e. the complex
//! roots of x^n + 1, which makes multiplication in the quotient ring a coefficient-wise product.
//! The recursion follows the tower of rings Q[x]/(x^n + 1) -> Q[x]/(x^(n/2) + 1): splitting a
//! polynomial into even and odd parts halves the degree, and the half-size evaluations are merged
//! with the square roots of the parent ring's roots.

use alloc::vec::Vec;
use core::f64::consts::PI;

use num_complex::Complex64;

#[cfg(not(feature = "std"))]
use num::Float;

use super::polynomial::Polynomial;

/// Returns the n complex roots of x^n + 1, ordered so that the roots of a size-n ring at
/// positions 2i and 2i+1 are the two square roots of the size-n/2 ring's root at position i.
///
/// With this ordering merge and split only ever touch the even-indexed roots of their own level,
/// matching the recursion structure of [`FastFft`].
fn roots(n: usize) -> Vec<Complex64> {
    debug_assert!(n.is_power_of_two());
    let mut angles = vec![PI];
    while angles.len() < n {
        let mut next = Vec::with_capacity(2 * angles.len());
        for &theta in &angles {
            next.push(0.5 * theta);
            next.push(0.5 * theta - PI);
        }
        angles = next;
    }
    angles.into_iter().map(|theta| Complex64::new(theta.cos(), theta.sin())).collect()
}

/// The negacyclic FFT and its inverse, together with the split/merge operations used by
/// fast Fourier sampling to descend the ring tower while staying in the frequency domain.
pub trait FastFft: Sized {
    /// Evaluates the polynomial at the roots of x^n + 1.
    fn fft(&self) -> Self;

    /// Interpolates a coefficient representation from the evaluations at the roots of x^n + 1.
    fn ifft(&self) -> Self;

    /// Splits the FFT of f into the FFTs of its even and odd parts f0, f1, where
    /// f(x) = f0(x^2) + x * f1(x^2). Inverse of [`Self::merge_fft`].
    fn split_fft(&self) -> (Self, Self);

    /// Merges the FFTs of the even and odd parts back into the FFT of the full polynomial.
    fn merge_fft(f0: &Self, f1: &Self) -> Self;
}

impl FastFft for Polynomial<Complex64> {
    fn fft(&self) -> Self {
        let n = self.coefficients.len();
        debug_assert!(n.is_power_of_two() && n >= 2);
        if n == 2 {
            let c0 = self.coefficients[0];
            let c1 = self.coefficients[1];
            // The roots of x^2 + 1 are i and -i.
            let i_c1 = Complex64::new(-c1.im, c1.re);
            return Polynomial::new(vec![c0 + i_c1, c0 - i_c1]);
        }
        let mut even = Vec::with_capacity(n / 2);
        let mut odd = Vec::with_capacity(n / 2);
        for (i, &c) in self.coefficients.iter().enumerate() {
            if i % 2 == 0 {
                even.push(c);
            } else {
                odd.push(c);
            }
        }
        let f0 = Polynomial::new(even).fft();
        let f1 = Polynomial::new(odd).fft();
        Self::merge_fft(&f0, &f1)
    }

    fn ifft(&self) -> Self {
        let n = self.coefficients.len();
        debug_assert!(n.is_power_of_two() && n >= 2);
        if n == 2 {
            let v0 = self.coefficients[0];
            let v1 = self.coefficients[1];
            let c0 = 0.5 * (v0 + v1);
            let d = 0.5 * (v0 - v1);
            // c1 = d / i
            let c1 = Complex64::new(d.im, -d.re);
            return Polynomial::new(vec![c0, c1]);
        }
        let (f0_fft, f1_fft) = self.split_fft();
        let f0 = f0_fft.ifft();
        let f1 = f1_fft.ifft();
        let mut coefficients = Vec::with_capacity(n);
        for i in 0..n / 2 {
            coefficients.push(f0.coefficients[i]);
            coefficients.push(f1.coefficients[i]);
        }
        Polynomial::new(coefficients)
    }

    fn split_fft(&self) -> (Self, Self) {
        let n = self.coefficients.len();
        let w = roots(n);
        let mut f0 = Vec::with_capacity(n / 2);
        let mut f1 = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            let even = self.coefficients[2 * i];
            let odd = self.coefficients[2 * i + 1];
            f0.push(0.5 * (even + odd));
            f1.push(0.5 * (even - odd) * w[2 * i].conj());
        }
        (Polynomial::new(f0), Polynomial::new(f1))
    }

    fn merge_fft(f0: &Self, f1: &Self) -> Self {
        let n = 2 * f0.coefficients.len();
        let w = roots(n);
        let mut coefficients = Vec::with_capacity(n);
        for i in 0..n / 2 {
            let a = f0.coefficients[i];
            let b = w[2 * i] * f1.coefficients[i];
            coefficients.push(a + b);
            coefficients.push(a - b);
        }
        Polynomial::new(coefficients)
    }
}

impl Polynomial<f64> {
    /// Lifts a real polynomial into the complex plane, typically right before an FFT.
    pub fn to_complex(&self) -> Polynomial<Complex64> {
        self.map(|&c| Complex64::new(c, 0.0))
    }
}

impl Polynomial<i16> {
    /// Lifts a small integer polynomial into the complex plane.
    pub fn to_complex(&self) -> Polynomial<Complex64> {
        self.map(|&c| Complex64::new(c as f64, 0.0))
    }
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use num_complex::Complex64;

    use super::{FastFft, Polynomial, roots};

    fn test_vector(n: usize) -> Polynomial<Complex64> {
        // Deterministic but irregular coefficients.
        let coefficients = (0..n)
            .map(|i| {
                let x = ((i as u64).wrapping_mul(2862933555777941757).wrapping_add(31337) >> 33)
                    as i64;
                Complex64::new(((x % 2001) - 1000) as f64, 0.0)
            })
            .collect();
        Polynomial::new(coefficients)
    }

    fn assert_approx_eq(a: &Polynomial<Complex64>, b: &Polynomial<Complex64>) {
        assert_eq!(a.coefficients.len(), b.coefficients.len());
        for (x, y) in a.coefficients.iter().zip(b.coefficients.iter()) {
            assert!((x - y).norm() < 1e-6, "{x} != {y}");
        }
    }

    /// Schoolbook multiplication in Z[x]/(x^n + 1).
    fn negacyclic_mul(a: &Polynomial<Complex64>, b: &Polynomial<Complex64>) -> Polynomial<Complex64> {
        let n = a.coefficients.len();
        let mut result = vec![Complex64::new(0.0, 0.0); n];
        for i in 0..n {
            for j in 0..n {
                let prod = a.coefficients[i] * b.coefficients[j];
                if i + j < n {
                    result[i + j] += prod;
                } else {
                    result[i + j - n] -= prod;
                }
            }
        }
        Polynomial::new(result)
    }

    #[test]
    fn roots_are_roots_of_x_n_plus_one() {
        for n in [2usize, 4, 8, 64] {
            for w in roots(n) {
                assert!((w.powu(n as u32) + 1.0).norm() < 1e-9);
            }
        }
    }

    #[test]
    fn fft_base_case_evaluates_at_plus_minus_i() {
        let f = Polynomial::new(vec![Complex64::new(3.0, 0.0), Complex64::new(5.0, 0.0)]);
        let f_fft = f.fft();
        assert_approx_eq(
            &f_fft,
            &Polynomial::new(vec![Complex64::new(3.0, 5.0), Complex64::new(3.0, -5.0)]),
        );
    }

    #[test]
    fn fft_roundtrip() {
        for n in [2usize, 4, 16, 256, 1024] {
            let f = test_vector(n);
            assert_approx_eq(&f.fft().ifft(), &f);
            assert_approx_eq(&f.ifft().fft(), &f);
        }
    }

    #[test]
    fn split_merge_roundtrip() {
        let f = test_vector(64).fft();
        let (f0, f1) = f.split_fft();
        assert_approx_eq(&Polynomial::merge_fft(&f0, &f1), &f);
    }

    #[test]
    fn hadamard_product_is_negacyclic_multiplication() {
        for n in [4usize, 8, 32] {
            let a = test_vector(n);
            let mut b = test_vector(n);
            b.coefficients.reverse();
            let expected = negacyclic_mul(&a, &b);
            let product = a.fft().hadamard_mul(&b.fft()).ifft();
            assert_approx_eq(&product, &expected);
        }
    }

    #[test]
    fn parseval_identity() {
        let f = test_vector(128);
        let time: f64 = f.coefficients.iter().map(|c| c.norm_sqr()).sum();
        let freq: f64 =
            f.fft().coefficients.iter().map(|c| c.norm_sqr()).sum::<f64>() / 128.0;
        assert!((time - freq).abs() / time < 1e-9);
    }

    #[test]
    fn fft_evaluates_at_each_root() {
        let n = 16;
        let f = test_vector(n);
        let f_fft = f.fft();
        for (k, w) in roots(n).into_iter().enumerate() {
            let direct: Complex64 = f
                .coefficients
                .iter()
                .rev()
                .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * w + c);
            assert!((direct - f_fft.coefficients[k]).norm() < 1e-6);
        }
    }
}

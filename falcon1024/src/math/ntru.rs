//! NTRU trapdoor generation: sampling the secret polynomials f, g and solving the NTRU
//! equation f·G − g·F = q over Z[x]/(x^n + 1).
//!
//! The solver descends a tower of rings via the field norm, solves a scalar Bezout identity
//! at the bottom, lifts the solution back up with Galois conjugates, and keeps the lifted
//! coefficients small with Babai reduction at every level. All ring arithmetic on this path
//! is exact big-integer arithmetic; floating point only appears inside the Babai step, where
//! the operands are first shifted down into 53-bit windows.

use alloc::{vec, vec::Vec};

#[cfg(not(feature = "std"))]
use num::Float;
use num::{BigInt, One, Signed, ToPrimitive, Zero};
use num_complex::Complex64;
use rand::Rng;

use super::{
    MODULUS,
    fft::FastFft,
    field::FalconFelt,
    ntt,
    polynomial::Polynomial,
    samplerz::sampler_z,
};
use crate::{
    N,
    error::{FalconError, KeygenRetry, SolveError},
};

// Standard deviation of the raw samples drawn during polynomial generation. Summing blocks of
// four yields coefficients with the target deviation 1.17 * sqrt(q / 2048).
const SIGMA_STAR: f64 = 1.4330098052877318;

// Squared Gram-Schmidt norm bound: (1.17)^2 * q.
const GS_NORM_BOUND: f64 = 1.17 * 1.17 * MODULUS as f64;

// Retry caps for key generation and for the ring-tower descent.
const MAX_ITERS: usize = 100;
const MAX_DEPTH: usize = 40;

// KEY PAIR GENERATION
// ================================================================================================

/// Generates an NTRU basis [f, g, F, G] with f·G − g·F = q in Z[x]/(x^n + 1).
///
/// Candidate (f, g) pairs are rejected until one has a small enough Gram-Schmidt norm, is
/// invertible mod q, and admits a solution (F, G) with coefficients that fit in 16 bits.
/// A solver descent that runs past its recursion-depth cap aborts key generation with the
/// offending depth instead of being retried; the cap is far above the log2(n) levels a
/// well-formed descent uses, so reaching it means the tower itself is broken.
pub(crate) fn ntru_gen<R: Rng>(rng: &mut R) -> Result<[Polynomial<i16>; 4], FalconError> {
    for _ in 0..MAX_ITERS {
        match attempt(rng) {
            Ok(basis) => return Ok(basis),
            Err(SolveError::DepthExceeded { depth }) => {
                return Err(FalconError::SolverDepthExceeded { depth });
            },
            Err(SolveError::Retry(_)) => {},
        }
    }
    Err(FalconError::KeygenRetriesExhausted(MAX_ITERS))
}

/// A single key generation attempt. All failure modes here are expected, frequent outcomes
/// of the rejection loop, so they surface as retry signals rather than hard errors.
fn attempt<R: Rng>(rng: &mut R) -> Result<[Polynomial<i16>; 4], SolveError> {
    let f = gen_poly(rng);
    let g = gen_poly(rng);

    let norm = gs_norm(&f, &g).ok_or(SolveError::Retry(KeygenRetry::ZeroDenominator))?;
    if norm > GS_NORM_BOUND {
        return Err(KeygenRetry::NormBoundExceeded.into());
    }

    let f_q: Polynomial<FalconFelt> = (&f).into();
    if ntt::ntt(&f_q).iter().any(|c| c.is_zero()) {
        return Err(KeygenRetry::NotInvertible.into());
    }

    let f_big: Vec<BigInt> = f.coefficients.iter().map(|&c| BigInt::from(c)).collect();
    let g_big: Vec<BigInt> = g.coefficients.iter().map(|&c| BigInt::from(c)).collect();
    let (big_f, big_g) = solve(&f_big, &g_big, 0)?;

    let big_f =
        small_polynomial(&big_f).ok_or(SolveError::Retry(KeygenRetry::CoefficientOverflow))?;
    let big_g =
        small_polynomial(&big_g).ok_or(SolveError::Retry(KeygenRetry::CoefficientOverflow))?;

    Ok([f, g, big_f, big_g])
}

/// Samples a degree-n polynomial whose coefficients follow a discrete Gaussian of deviation
/// 1.17 * sqrt(q / 2n), by oversampling 4096 narrow Gaussians and summing them blockwise.
pub(crate) fn gen_poly<R: Rng>(rng: &mut R) -> Polynomial<i16> {
    const OVERSAMPLE: usize = 4096;
    let block = OVERSAMPLE / N;
    let samples: Vec<i16> =
        (0..OVERSAMPLE).map(|_| sampler_z(0.0, SIGMA_STAR, SIGMA_STAR - 0.001, rng)).collect();
    Polynomial::new(
        (0..N).map(|i| (0..block).map(|j| samples[block * i + j]).sum()).collect(),
    )
}

/// Computes the squared Gram-Schmidt norm of the NTRU basis generated by (f, g): the larger
/// of |(f, g)|^2 and q^2 |(F*, G*)|^2, where (F*, G*) is the orthogonalized second row.
/// Returns `None` when (f, g) vanishes at some frequency, in which case the candidate pair
/// must be rejected anyway.
pub(crate) fn gs_norm(f: &Polynomial<i16>, g: &Polynomial<i16>) -> Option<f64> {
    let norm_fg = (f.norm_squared() + g.norm_squared()) as f64;

    let f_fft = f.to_complex().fft();
    let g_fft = g.to_complex().fft();
    let n = f_fft.coefficients.len() as f64;
    let mut acc = 0.0;
    for (fc, gc) in f_fft.coefficients.iter().zip(g_fft.coefficients.iter()) {
        // |F*|^2 + |G*|^2 per frequency collapses to 1 / (|f|^2 + |g|^2).
        let denominator = fc.norm_sqr() + gc.norm_sqr();
        if denominator == 0.0 {
            return None;
        }
        acc += 1.0 / denominator;
    }
    let norm_orthogonalized = (MODULUS as f64) * (MODULUS as f64) * acc / n;

    Some(norm_fg.max(norm_orthogonalized))
}

fn small_polynomial(coefficients: &[BigInt]) -> Option<Polynomial<i16>> {
    coefficients
        .iter()
        .map(|c| c.to_i16())
        .collect::<Option<Vec<i16>>>()
        .map(Polynomial::new)
}

// NTRU EQUATION SOLVER
// ================================================================================================

/// Solves f·G − g·F = q in Z[x]/(x^n + 1), threading the recursion depth explicitly.
pub(crate) fn solve(
    f: &[BigInt],
    g: &[BigInt],
    depth: usize,
) -> Result<(Vec<BigInt>, Vec<BigInt>), SolveError> {
    if depth > MAX_DEPTH {
        return Err(SolveError::DepthExceeded { depth });
    }

    let n = f.len();
    if n == 1 {
        // Bezout: u·f0 + v·g0 = 1, so F = -v·q and G = u·q solve the scalar equation.
        let (d, u, v) = xgcd(&f[0], &g[0]);
        if !d.is_one() {
            return Err(KeygenRetry::NotCoprime.into());
        }
        let q = BigInt::from(MODULUS);
        return Ok((vec![-(&v * &q)], vec![&u * &q]));
    }

    let f_prime = field_norm(f);
    let g_prime = field_norm(g);
    let (big_f_prime, big_g_prime) = solve(&f_prime, &g_prime, depth + 1)?;

    let mut big_f = karamul(&lift(&big_f_prime), &galois_conjugate(g));
    let mut big_g = karamul(&lift(&big_g_prime), &galois_conjugate(f));
    reduce(f, g, &mut big_f, &mut big_g)?;

    Ok((big_f, big_g))
}

/// Iterative extended Euclid. Returns (d, u, v) with a·u + b·v = d and d >= 0.
pub(crate) fn xgcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_u, mut u) = (BigInt::one(), BigInt::zero());
    let (mut old_v, mut v) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let quotient = &old_r / &r;
        let next_r = &old_r - &quotient * &r;
        old_r = core::mem::replace(&mut r, next_r);
        let next_u = &old_u - &quotient * &u;
        old_u = core::mem::replace(&mut u, next_u);
        let next_v = &old_v - &quotient * &v;
        old_v = core::mem::replace(&mut v, next_v);
    }

    if old_r.is_negative() {
        (-old_r, -old_u, -old_v)
    } else {
        (old_r, old_u, old_v)
    }
}

/// Karatsuba multiplication of equal-length (power of two) coefficient slices; the result has
/// length 2n and is not reduced modulo x^n + 1.
fn karatsuba(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    let n = a.len();
    if n <= 8 {
        let mut result = vec![BigInt::zero(); 2 * n];
        for i in 0..n {
            for j in 0..n {
                result[i + j] += &a[i] * &b[j];
            }
        }
        return result;
    }

    let half = n / 2;
    let (a0, a1) = a.split_at(half);
    let (b0, b1) = b.split_at(half);
    let a_cross: Vec<BigInt> = a0.iter().zip(a1.iter()).map(|(x, y)| x + y).collect();
    let b_cross: Vec<BigInt> = b0.iter().zip(b1.iter()).map(|(x, y)| x + y).collect();

    let low = karatsuba(a0, b0);
    let high = karatsuba(a1, b1);
    let cross = karatsuba(&a_cross, &b_cross);

    let mut result = vec![BigInt::zero(); 2 * n];
    for i in 0..n {
        result[i] += &low[i];
        result[half + i] += &cross[i] - &low[i] - &high[i];
        result[n + i] += &high[i];
    }
    result
}

/// Multiplies in Z[x]/(x^n + 1): Karatsuba followed by the negacyclic fold.
fn karamul(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    let n = a.len();
    let product = karatsuba(a, b);
    (0..n).map(|i| &product[i] - &product[i + n]).collect()
}

/// The Galois conjugate a(-x): negate the odd coefficients.
fn galois_conjugate(a: &[BigInt]) -> Vec<BigInt> {
    a.iter()
        .enumerate()
        .map(|(i, c)| if i % 2 == 0 { c.clone() } else { -c })
        .collect()
}

/// The field norm N(a) = a_even^2 − x·a_odd^2, a polynomial in the half-size ring.
fn field_norm(a: &[BigInt]) -> Vec<BigInt> {
    let half = a.len() / 2;
    let even: Vec<BigInt> = a.iter().step_by(2).cloned().collect();
    let odd: Vec<BigInt> = a.iter().skip(1).step_by(2).cloned().collect();

    let even_squared = karamul(&even, &even);
    let odd_squared = karamul(&odd, &odd);

    let mut result = even_squared;
    for i in 0..half - 1 {
        result[i + 1] -= &odd_squared[i];
    }
    result[0] += &odd_squared[half - 1];
    result
}

/// Embeds a polynomial from Z[x]/(x^(n/2) + 1) into Z[x]/(x^n + 1) via x -> x^2.
fn lift(a: &[BigInt]) -> Vec<BigInt> {
    let mut result = vec![BigInt::zero(); 2 * a.len()];
    for (i, c) in a.iter().enumerate() {
        result[2 * i] = c.clone();
    }
    result
}

/// Coefficient magnitude in whole bytes, as a bit count.
fn bitsize(value: &BigInt) -> u64 {
    value.bits().div_ceil(8) * 8
}

/// Shifts the coefficients down into a 53-bit window and lifts them to the FFT domain.
fn adjust(coefficients: &[BigInt], size: u64) -> Polynomial<Complex64> {
    let shift = (size - 53) as usize;
    Polynomial::new(
        coefficients
            .iter()
            .map(|c| Complex64::new((c >> shift).to_f64().unwrap_or(0.0), 0.0))
            .collect(),
    )
    .fft()
}

/// Babai reduction: repeatedly subtracts k·(f, g) from (F, G), with k the rounded FFT-domain
/// quotient <(F, G), (f, g)> / <(f, g), (f, g)>, computed on 53-bit windows of the operands
/// so that each pass shaves roughly a word off the coefficients.
fn reduce(
    f: &[BigInt],
    g: &[BigInt],
    big_f: &mut [BigInt],
    big_g: &mut [BigInt],
) -> Result<(), SolveError> {
    let n = f.len();
    let size = f
        .iter()
        .chain(g.iter())
        .map(bitsize)
        .max()
        .unwrap_or(0)
        .max(53);
    let f_fft = adjust(f, size);
    let g_fft = adjust(g, size);

    loop {
        let big_size = big_f
            .iter()
            .chain(big_g.iter())
            .map(bitsize)
            .max()
            .unwrap_or(0)
            .max(53);
        if big_size < size {
            break;
        }
        let big_f_fft = adjust(big_f, big_size);
        let big_g_fft = adjust(big_g, big_size);

        let mut k_fft = Vec::with_capacity(n);
        for i in 0..n {
            let fc = f_fft.coefficients[i];
            let gc = g_fft.coefficients[i];
            let denominator = fc.norm_sqr() + gc.norm_sqr();
            if denominator == 0.0 {
                return Err(KeygenRetry::ZeroDenominator.into());
            }
            let numerator =
                big_f_fft.coefficients[i] * fc.conj() + big_g_fft.coefficients[i] * gc.conj();
            k_fft.push(numerator / denominator);
        }

        let k: Vec<BigInt> = Polynomial::new(k_fft)
            .ifft()
            .coefficients
            .iter()
            .map(|c| BigInt::from(c.re.round() as i64))
            .collect();
        if k.iter().all(|c| c.is_zero()) {
            break;
        }

        let fk = karamul(f, &k);
        let gk = karamul(g, &k);
        let shift = (big_size - size) as usize;
        for i in 0..n {
            big_f[i] -= &fk[i] << shift;
            big_g[i] -= &gk[i] << shift;
        }
    }

    Ok(())
}

// TESTS
// ================================================================================================

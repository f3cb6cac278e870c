use alloc::boxed::Box;

#[cfg(not(feature = "std"))]
use num::Float;
use num::Zero;
use num_complex::Complex64;
use rand::Rng;

use super::{fft::FastFft, polynomial::Polynomial, samplerz::sampler_z};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Computes the Gram matrix. The argument must be a 2x2 matrix
/// whose elements are equal-length vectors of complex numbers,
/// representing polynomials in FFT domain.
pub fn gram(b: &[Polynomial<Complex64>; 4]) -> [Polynomial<Complex64>; 4] {
    const N: usize = 2;
    let mut g: [Polynomial<Complex64>; 4] =
        [Polynomial::zero(), Polynomial::zero(), Polynomial::zero(), Polynomial::zero()];
    for i in 0..N {
        for j in 0..N {
            for k in 0..N {
                g[N * i + j] = g[N * i + j].clone()
                    + b[N * i + k].hadamard_mul(&b[N * j + k].map(|c| c.conj()));
            }
        }
    }
    g
}

/// Computes the LDL decomposition of a 2x2 matrix G such that
///     L D L* = G
/// where D is diagonal, and L is lower-triangular. The elements of the matrices are in FFT
/// domain, so the decomposition is independent per frequency.
///
/// Returns only the non-trivial elements: (l10, d00, d11) where:
/// - l10: the lower-left element of L (L[1,0])
/// - d00: the top-left diagonal element of D (D[0,0])
/// - d11: the bottom-right diagonal element of D (D[1,1])
pub fn ldl(
    g: &[Polynomial<Complex64>; 4],
) -> (Polynomial<Complex64>, Polynomial<Complex64>, Polynomial<Complex64>) {
    let l10 = g[2].hadamard_div(&g[0]);
    let bc = l10.map(|c| c * c.conj());
    let abc = g[0].hadamard_mul(&bc);
    let d11 = g[3].clone() - abc;

    (l10, g[0].clone(), d11)
}

/// The LDL decomposition of the basis Gram matrix, refined level by level for sampling.
///
/// Each branch holds the l10 polynomial of its ring size together with the decompositions
/// of the two diagonal blocks over the half-size ring, obtained by splitting their FFT
/// vectors. The leaves hold the fully split diagonal values, which [`normalize_tree`]
/// replaces with the standard deviations the Gaussian sampler consumes.
#[derive(Debug, Clone)]
pub enum LdlTree {
    Branch(Polynomial<Complex64>, Box<LdlTree>, Box<LdlTree>),
    Leaf([Complex64; 2]),
}

impl LdlTree {
    /// Builds the normalized tree from the FFT-domain secret basis [b00, b01, b10, b11] and
    /// the target standard deviation.
    pub fn new(b0_fft: &[Polynomial<Complex64>; 4], sigma: f64) -> Self {
        let mut tree = ffldl(gram(b0_fft));
        normalize_tree(&mut tree, sigma);
        tree
    }
}

/// Decomposes the Gram matrix recursively: LDL at the current ring size, then descent into
/// the two diagonal blocks, each reinterpreted as a 2x2 Gram matrix over the half-size ring
/// via the split of its FFT vector.
pub fn ffldl(gram_matrix: [Polynomial<Complex64>; 4]) -> LdlTree {
    let n = gram_matrix[0].coefficients.len();
    let (l10, d00, d11) = ldl(&gram_matrix);

    if n > 2 {
        let (d00_left, d00_right) = d00.split_fft();
        let (d11_left, d11_right) = d11.split_fft();
        let g0 = [d00_left.clone(), d00_right.clone(), d00_right.map(|c| c.conj()), d00_left];
        let g1 = [d11_left.clone(), d11_right.clone(), d11_right.map(|c| c.conj()), d11_left];
        LdlTree::Branch(l10, Box::new(ffldl(g0)), Box::new(ffldl(g1)))
    } else {
        let leaf =
            |d: &Polynomial<Complex64>| LdlTree::Leaf([d.coefficients[0], d.coefficients[1]]);
        LdlTree::Branch(l10, Box::new(leaf(&d00)), Box::new(leaf(&d11)))
    }
}

/// Replaces every leaf value d with the per-leaf standard deviation sigma / sqrt(d).
pub fn normalize_tree(tree: &mut LdlTree, sigma: f64) {
    match tree {
        LdlTree::Branch(_, left, right) => {
            normalize_tree(left, sigma);
            normalize_tree(right, sigma);
        },
        LdlTree::Leaf(value) => {
            value[0] = Complex64::new(sigma / value[0].re.sqrt(), 0.0);
            value[1] = Complex64::zero();
        },
    }
}

impl Zeroize for LdlTree {
    fn zeroize(&mut self) {
        match self {
            LdlTree::Branch(l10, left, right) => {
                // write_volatile prevents the compiler from eliding the dead stores.
                for value in l10.coefficients.iter_mut() {
                    unsafe {
                        core::ptr::write_volatile(value, Complex64::new(0.0, 0.0));
                    }
                }
                left.zeroize();
                right.zeroize();
            },
            LdlTree::Leaf(value) => {
                for v in value.iter_mut() {
                    unsafe {
                        core::ptr::write_volatile(v, Complex64::new(0.0, 0.0));
                    }
                }
            },
        }
        core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
    }
}

impl Drop for LdlTree {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for LdlTree {}

/// Samples a lattice point close to the FFT-domain target pair (t0, t1).
///
/// z1 is drawn first by descending the right subtree on the split of t1; the residual
/// (t1 - z1) * l10 then shifts t0 before z0 is drawn the same way down the left subtree.
/// The recursion bottoms out on single coefficients, where the integer Gaussian sampler
/// runs with the leaf deviation. Both outputs are integer vectors, still in FFT form.
pub fn ff_sampling<R: Rng>(
    t0_fft: &Polynomial<Complex64>,
    t1_fft: &Polynomial<Complex64>,
    tree: &LdlTree,
    sigmin: f64,
    rng: &mut R,
) -> (Polynomial<Complex64>, Polynomial<Complex64>) {
    sample_tree(&(t0_fft.clone(), t1_fft.clone()), tree, sigmin, rng)
}

fn sample_tree<R: Rng>(
    t: &(Polynomial<Complex64>, Polynomial<Complex64>),
    tree: &LdlTree,
    sigmin: f64,
    rng: &mut R,
) -> (Polynomial<Complex64>, Polynomial<Complex64>) {
    match tree {
        LdlTree::Branch(l10, left, right) => {
            let z1_halves = sample_tree(&t.1.split_fft(), right, sigmin, rng);
            let z1 = Polynomial::<Complex64>::merge_fft(&z1_halves.0, &z1_halves.1);

            let t0_shifted = t.0.clone() + (t.1.clone() - z1.clone()).hadamard_mul(l10);
            let z0_halves = sample_tree(&t0_shifted.split_fft(), left, sigmin, rng);
            let z0 = Polynomial::<Complex64>::merge_fft(&z0_halves.0, &z0_halves.1);

            (z0, z1)
        },
        LdlTree::Leaf(value) => {
            let z0 = sampler_z(t.0.coefficients[0].re, value[0].re, sigmin, rng);
            let z1 = sampler_z(t.1.coefficients[0].re, value[0].re, sigmin, rng);
            (
                Polynomial::new(vec![Complex64::new(z0 as f64, 0.0)]),
                Polynomial::new(vec![Complex64::new(z1 as f64, 0.0)]),
            )
        },
    }
}

// TESTS
// ================================================================================================

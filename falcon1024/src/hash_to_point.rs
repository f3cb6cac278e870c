use alloc::vec::Vec;

use sha3::{
    Shake256,
    digest::{ExtendableOutput, Update, XofReader},
};

use crate::{
    MODULUS, N, Salt,
    math::{FalconFelt, Polynomial},
};

// The largest multiple of q below 2^16, as a multiplier: 16-bit candidates at or above K * q
// are rejected so that accepted values reduce to a uniform element of Z/qZ.
const K: u32 = (1u32 << 16) / MODULUS as u32;

/// Hashes (domain, salt, message) to a uniformly random point in Z_q[x]/(x^n + 1).
///
/// SHAKE256 output is consumed as big-endian 16-bit chunks under rejection sampling, so the
/// point depends on the full input and nothing else; verification recomputes it from the
/// salt carried in the signature.
pub(crate) fn hash_to_point(domain: &[u8], salt: &Salt, message: &[u8]) -> Polynomial<FalconFelt> {
    let mut hasher = Shake256::default();
    hasher.update(domain);
    hasher.update(salt.as_bytes());
    hasher.update(message);
    let mut reader = hasher.finalize_xof();

    let mut coefficients: Vec<FalconFelt> = Vec::with_capacity(N);
    while coefficients.len() < N {
        let mut chunk = [0u8; 2];
        reader.read(&mut chunk);
        let candidate = u16::from_be_bytes(chunk) as u32;
        if candidate < K * MODULUS as u32 {
            coefficients.push(FalconFelt::new((candidate % MODULUS as u32) as u16));
        }
    }

    Polynomial::new(coefficients)
}

// TESTS
// ================================================================================================

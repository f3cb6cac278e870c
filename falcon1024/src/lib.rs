#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use rand_core::RngCore;

mod context;
mod error;
mod hash_to_point;
mod keys;
pub mod math;
mod prng;
mod signature;
pub mod utils;

// RE-EXPORTS
// ================================================================================================
pub use error::FalconError;
pub use keys::{PublicKey, SecretKey};
pub use prng::SeededRng;
pub use signature::Signature;

use crate::utils::{
    ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable,
};


// CONSTANTS
// ================================================================================================

/// The degree n of the polynomial ring Z_q[x] / (x^n + 1).
pub const N: usize = 1024;

/// Base-2 logarithm of [`N`].
pub const LOG_N: u8 = 10;

/// The prime modulus q of the coefficient field.
pub const MODULUS: i16 = 12289;

/// Standard deviation of the signature distribution over the lattice.
pub(crate) const SIGMA: f64 = 168.38857144654395;

/// Lower cutoff for the per-slot standard deviations inside the fast-Fourier sampler.
pub(crate) const SIGMIN: f64 = 1.298280334344292;

/// Acceptance bound on the squared L2 norm of the short vector (s0, s1).
pub const SIG_L2_BOUND: u64 = 70265242;

/// Number of random salt bytes hashed together with the message.
pub const SALT_LEN: usize = 40;

/// Number of seed bytes consumed by deterministic signing.
pub const SEED_LEN: usize = 56;

/// Serialized public key length: a header byte plus 1024 coefficients of 14 bits each.
pub const PK_LEN: usize = 1793;

/// Serialized secret key length: four polynomials of 1024 coefficients, two bytes each.
pub const SK_LEN: usize = 8 * N;

/// Serialized signature length: the salt followed by s0 and s1 as 16-bit values.
pub const SIG_LEN: usize = SALT_LEN + 4 * N;

// SALT
// ================================================================================================

/// The random salt hashed together with the domain separator and the message to produce the
/// target point of a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draws a fresh salt from the provided random number generator.
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SALT_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wraps raw salt bytes.
    pub const fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes.
    pub const fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl Serializable for Salt {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_bytes(&self.0);
    }
}

impl Deserializable for Salt {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let bytes = source.read_array::<SALT_LEN>()?;
        Ok(Self(bytes))
    }
}

use alloc::{string::ToString, vec::Vec};
use core::fmt;

use num_complex::Complex64;
use rand::{CryptoRng, Rng};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::PublicKey;
use crate::{
    MODULUS, N, SEED_LEN, SIG_L2_BOUND, SIGMIN, Salt,
    context::FalconContext,
    error::FalconError,
    hash_to_point::hash_to_point,
    math::{FalconFelt, FastFft, Polynomial, ffsampling::ff_sampling, ntru::ntru_gen},
    prng::SeededRng,
    signature::Signature,
    utils::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// CONSTANTS
// ================================================================================================

/// Number of times the sampler is retried before signing gives up on a message.
const MAX_SIGN_ATTEMPTS: usize = 64;

// SECRET KEY
// ================================================================================================

/// A secret key: the short basis [f, g, F, G] of the NTRU lattice, satisfying
/// f * G - g * F = q in Z[x] / (x^n + 1).
///
/// The key material is wiped from memory when the key is dropped.
pub struct SecretKey {
    basis: [Polynomial<i16>; 4],
}

impl SecretKey {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Generates a secret key from OS-provided randomness.
    #[cfg(feature = "std")]
    pub fn new() -> Result<Self, FalconError> {
        let mut rng = rand::rng();
        Self::with_rng(&mut rng)
    }

    /// Generates a secret key using the provided random number generator.
    pub fn with_rng<R: Rng + CryptoRng>(rng: &mut R) -> Result<Self, FalconError> {
        let basis = ntru_gen(rng)?;
        Ok(Self { basis })
    }

    /// Wraps an externally stored basis [f, g, F, G].
    ///
    /// The polynomials must have length n each and satisfy the NTRU equation; keys read from
    /// untrusted bytes go through [`Deserializable`], which checks both.
    pub fn from_basis(basis: [Polynomial<i16>; 4]) -> Self {
        Self { basis }
    }

    // ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the short basis [f, g, F, G].
    pub fn basis(&self) -> &[Polynomial<i16>; 4] {
        &self.basis
    }

    /// Derives the public key h = g / f over Z_q.
    pub fn public_key(&self) -> Result<PublicKey, FalconError> {
        let context = FalconContext::new(&self.basis)?;
        Ok(PublicKey::from_polynomial(&context.h))
    }

    // SIGNATURE GENERATION
    // --------------------------------------------------------------------------------------------

    /// Signs `message` bound to `domain` with randomness from the provided generator.
    ///
    /// A fresh salt is drawn once per call and kept across sampler retries, so retrying only
    /// redraws the lattice point. Fails if no short enough vector is found within
    /// [`MAX_SIGN_ATTEMPTS`] attempts, which for a well-formed key is vanishingly unlikely.
    pub fn sign<R: Rng + CryptoRng>(
        &self,
        domain: &[u8],
        message: &[u8],
        rng: &mut R,
    ) -> Result<Signature, FalconError> {
        let context = FalconContext::new(&self.basis)?;
        let salt = Salt::random(rng);
        let point = hash_to_point(domain, &salt, message);
        let point_fft = Polynomial::new(
            point
                .coefficients
                .iter()
                .map(|c| Complex64::new(c.value() as f64, 0.0))
                .collect::<Vec<_>>(),
        )
        .fft();

        // Target (t0, t1) = (point, 0) * B^(-1), using B^(-1) = [[-F, f], [G, -g]] / q.
        let q = MODULUS as f64;
        let t0 = point_fft.hadamard_mul(&context.b0_fft[3]).map(|c| *c / q);
        let t1 = point_fft.hadamard_mul(&context.b0_fft[1]).map(|c| -*c / q);

        for _ in 0..MAX_SIGN_ATTEMPTS {
            let (z0, z1) = ff_sampling(&t0, &t1, &context.tree, SIGMIN, rng);

            let v0_fft = z0.hadamard_mul(&context.b0_fft[0]) + z1.hadamard_mul(&context.b0_fft[2]);
            let v1_fft = z0.hadamard_mul(&context.b0_fft[1]) + z1.hadamard_mul(&context.b0_fft[3]);
            let v0 = v0_fft.ifft();
            let v1 = v1_fft.ifft();

            let s0: Vec<i64> = point
                .coefficients
                .iter()
                .zip(v0.coefficients.iter())
                .map(|(p, v)| p.value() as i64 - v.re.round() as i64)
                .collect();
            let s1: Vec<i64> = v1.coefficients.iter().map(|v| -(v.re.round() as i64)).collect();

            let norm: i64 = s0.iter().chain(s1.iter()).map(|&s| s * s).sum();
            if norm as u64 > SIG_L2_BOUND {
                continue;
            }

            let reduce = |values: &[i64]| -> Polynomial<FalconFelt> {
                Polynomial::new(values.iter().map(|&v| FalconFelt::from(v as i16)).collect())
            };
            return Ok(Signature::new(salt, reduce(&s0), reduce(&s1)));
        }

        Err(FalconError::SigningRetriesExhausted(MAX_SIGN_ATTEMPTS))
    }

    /// Signs `message` bound to `domain` deterministically: the salt and all sampler
    /// randomness are derived from `seed`, so equal inputs produce equal signatures.
    pub fn sign_deterministic(
        &self,
        domain: &[u8],
        message: &[u8],
        seed: &[u8; SEED_LEN],
    ) -> Result<Signature, FalconError> {
        let mut rng = SeededRng::from_seed(seed);
        self.sign(domain, message, &mut rng)
    }

    // KEY STORAGE
    // --------------------------------------------------------------------------------------------

    /// Encodes the basis as four independent byte strings, one per polynomial in the order
    /// [f, g, F, G], for storage backends that persist the parts under separate names. Each
    /// part is 1024 little-endian 16-bit coefficients.
    pub fn to_parts(&self) -> [Vec<u8>; 4] {
        let encode = |polynomial: &Polynomial<i16>| {
            let mut bytes = Vec::with_capacity(2 * N);
            for &c in polynomial.coefficients.iter() {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
            bytes
        };
        [
            encode(&self.basis[0]),
            encode(&self.basis[1]),
            encode(&self.basis[2]),
            encode(&self.basis[3]),
        ]
    }

    /// Rebuilds a key from four stored parts in the order [f, g, F, G].
    ///
    /// Only lengths are checked here; parts coming from an untrusted source should go through
    /// [`Deserializable`] instead, which also re-checks the NTRU equation.
    pub fn from_parts(parts: [&[u8]; 4]) -> Result<Self, FalconError> {
        let decode = |bytes: &[u8]| -> Result<Polynomial<i16>, FalconError> {
            if bytes.len() != 2 * N {
                return Err(FalconError::InvalidKeyLength {
                    expected: 2 * N,
                    actual: bytes.len(),
                });
            }
            Ok(Polynomial::new(
                bytes
                    .chunks_exact(2)
                    .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
                    .collect(),
            ))
        };
        let [f, g, big_f, big_g] = parts;
        Ok(Self {
            basis: [decode(f)?, decode(g)?, decode(big_f)?, decode(big_g)?],
        })
    }

    // VALIDATION
    // --------------------------------------------------------------------------------------------

    /// Checks f * G - g * F = q in Z[x] / (x^n + 1).
    pub(crate) fn satisfies_ntru_equation(&self) -> bool {
        let [f, g, big_f, big_g] = &self.basis;
        if self.basis.iter().any(|p| p.coefficients.len() != N) {
            return false;
        }
        let fg = negacyclic_mul(f, big_g);
        let gf = negacyclic_mul(g, big_f);
        if fg[0] - gf[0] != MODULUS as i64 {
            return false;
        }
        (1..N).all(|i| fg[i] == gf[i])
    }
}

/// Schoolbook product in Z[x] / (x^n + 1) with i64 accumulation, for key validation only.
fn negacyclic_mul(a: &Polynomial<i16>, b: &Polynomial<i16>) -> Vec<i64> {
    let mut product = vec![0i64; N];
    for (i, &ai) in a.coefficients.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        for (j, &bj) in b.coefficients.iter().enumerate() {
            let term = ai as i64 * bj as i64;
            let k = i + j;
            if k < N {
                product[k] += term;
            } else {
                product[k - N] -= term;
            }
        }
    }
    product
}

// SERIALIZATION / DESERIALIZATION
// ================================================================================================

impl Serializable for SecretKey {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        for polynomial in self.basis.iter() {
            for &c in polynomial.coefficients.iter() {
                target.write_u16(c as u16);
            }
        }
    }
}

impl Deserializable for SecretKey {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let f = read_polynomial(source)?;
        let g = read_polynomial(source)?;
        let big_f = read_polynomial(source)?;
        let big_g = read_polynomial(source)?;

        let key = Self { basis: [f, g, big_f, big_g] };
        if !key.satisfies_ntru_equation() {
            return Err(DeserializationError::InvalidValue(
                "secret key basis does not satisfy the NTRU equation".to_string(),
            ));
        }
        Ok(key)
    }
}

fn read_polynomial<R: ByteReader>(
    source: &mut R,
) -> Result<Polynomial<i16>, DeserializationError> {
    let mut coefficients = Vec::with_capacity(N);
    for _ in 0..N {
        coefficients.push(source.read_u16()? as i16);
    }
    Ok(Polynomial::new(coefficients))
}

// TRAIT IMPLEMENTATIONS
// ================================================================================================

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey").finish_non_exhaustive()
    }
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        for polynomial in self.basis.iter_mut() {
            polynomial.zeroize();
        }
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for SecretKey {}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::{Deserializable, MODULUS, N, Polynomial, SecretKey, Serializable};
    use crate::SK_LEN;

    /// f = 1, g = x, F = 0, G = q is a (useless but well-formed) solution of the NTRU
    /// equation, cheap enough for codec tests.
    fn trivial_key() -> SecretKey {
        let constant = |value: i16| {
            let mut coefficients = vec![0i16; N];
            coefficients[0] = value;
            Polynomial::new(coefficients)
        };
        let mut g = constant(0);
        g.coefficients[1] = 1;
        SecretKey::from_basis([constant(1), g, constant(0), constant(MODULUS)])
    }

    #[test]
    fn trivial_basis_satisfies_the_ntru_equation() {
        assert!(trivial_key().satisfies_ntru_equation());

        let mut broken = trivial_key();
        broken.basis[3].coefficients[0] += 1;
        assert!(!broken.satisfies_ntru_equation());
    }

    #[test]
    fn serialization_roundtrip() {
        let key = trivial_key();
        let bytes = key.to_bytes();
        assert_eq!(bytes.len(), SK_LEN);

        let restored = SecretKey::read_from_bytes(&bytes).unwrap();
        assert_eq!(restored.to_bytes(), bytes);
        assert_eq!(restored.basis(), key.basis());
    }

    #[test]
    fn storage_parts_roundtrip() {
        let key = trivial_key();
        let parts = key.to_parts();
        assert!(parts.iter().all(|p| p.len() == 2 * N));

        let restored =
            SecretKey::from_parts([&parts[0], &parts[1], &parts[2], &parts[3]]).unwrap();
        assert_eq!(restored.basis(), key.basis());

        assert!(SecretKey::from_parts([&parts[0][1..], &parts[1], &parts[2], &parts[3]]).is_err());
    }

    #[test]
    fn deserialization_rejects_an_inconsistent_basis() {
        let mut bytes = trivial_key().to_bytes();
        // Corrupt a coefficient of f.
        bytes[0] ^= 1;
        assert!(SecretKey::read_from_bytes(&bytes).is_err());
    }

    #[test]
    fn debug_output_is_redacted() {
        let rendered = format!("{:?}", trivial_key());
        assert_eq!(rendered, "SecretKey { .. }");
        assert!(!rendered.contains("12289"));
    }

    #[test]
    fn public_key_of_the_trivial_basis_is_g_over_f() {
        // With f = 1, h = g, whose only nonzero coefficient is h[1] = 1.
        let h = trivial_key().public_key().unwrap().to_polynomial();
        assert_eq!(h.coefficients[1].value(), 1);
        assert!(h.coefficients.iter().enumerate().all(|(i, c)| i == 1 || c.value() == 0));
    }
}

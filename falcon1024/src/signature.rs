use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use crate::{
    MODULUS, N, SIG_L2_BOUND, SIG_LEN, Salt,
    hash_to_point::hash_to_point,
    math::{FalconFelt, Polynomial, ntt},
    utils::{
        ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable,
        bytes_to_hex_string, hex_to_bytes,
    },
};

// SIGNATURE
// ================================================================================================

/// A signature: the salt together with both halves (s0, s1) of the short lattice vector.
///
/// Both polynomials are carried on the wire, so verification recomputes s0 from the public
/// key and checks it against the carried value instead of reconstructing it from scratch.
/// Coefficients are stored reduced modulo q; shortness is judged on their balanced
/// representatives in (-q/2, q/2].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    salt: Salt,
    s0: Polynomial<FalconFelt>,
    s1: Polynomial<FalconFelt>,
}

impl Signature {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    pub(crate) fn new(salt: Salt, s0: Polynomial<FalconFelt>, s1: Polynomial<FalconFelt>) -> Self {
        Self { salt, s0, s1 }
    }

    /// Parses a signature from its 0x-prefixed hex transport form.
    pub fn from_hex(value: &str) -> Result<Self, DeserializationError> {
        let bytes = hex_to_bytes(value, SIG_LEN)
            .map_err(|err| DeserializationError::InvalidValue(err.to_string()))?;
        Self::read_from_bytes(&bytes)
    }

    // ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the salt that was hashed together with the message.
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Returns the first half of the short vector.
    pub fn s0(&self) -> &Polynomial<FalconFelt> {
        &self.s0
    }

    /// Returns the second half of the short vector.
    pub fn s1(&self) -> &Polynomial<FalconFelt> {
        &self.s1
    }

    /// Renders the serialized signature as a 0x-prefixed hex string.
    pub fn to_hex(&self) -> String {
        bytes_to_hex_string(&self.to_bytes())
    }

    // SIGNATURE VERIFICATION
    // --------------------------------------------------------------------------------------------

    /// Verifies this signature over `message` bound to `domain` under the public-key
    /// polynomial `h`.
    ///
    /// The target point is recomputed from the carried salt, and s0 is recomputed over Z_q as
    /// point - s1 * h. The signature is valid when the carried s0 matches the recomputation
    /// and the centered pair (s0, s1) satisfies the squared-norm bound.
    pub fn verify(&self, domain: &[u8], message: &[u8], h: &Polynomial<FalconFelt>) -> bool {
        if self.s0.coefficients.len() != N
            || self.s1.coefficients.len() != N
            || h.coefficients.len() != N
        {
            return false;
        }

        let point = hash_to_point(domain, &self.salt, message);
        let s0_check = point - ntt::mul_zq(&self.s1, h);
        if s0_check != self.s0 {
            return false;
        }

        self.s0.norm_squared() + self.s1.norm_squared() <= SIG_L2_BOUND
    }
}

// SERIALIZATION / DESERIALIZATION
// ================================================================================================

impl Serializable for Signature {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.salt.write_into(target);
        for value in self.s0.coefficients.iter().chain(self.s1.coefficients.iter()) {
            target.write_bytes(&value.value().to_be_bytes());
        }
    }
}

impl Deserializable for Signature {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let salt = Salt::read_from(source)?;
        let s0 = read_polynomial(source)?;
        let s1 = read_polynomial(source)?;
        Ok(Self { salt, s0, s1 })
    }
}

/// Reads n big-endian 16-bit coefficients, rejecting any value not reduced modulo q.
fn read_polynomial<R: ByteReader>(
    source: &mut R,
) -> Result<Polynomial<FalconFelt>, DeserializationError> {
    let mut coefficients = Vec::with_capacity(N);
    for _ in 0..N {
        let chunk: [u8; 2] = source.read_array()?;
        let value = u16::from_be_bytes(chunk);
        if value >= MODULUS as u16 {
            return Err(DeserializationError::InvalidValue(format!(
                "signature coefficient {value} is not reduced modulo {MODULUS}"
            )));
        }
        coefficients.push(FalconFelt::new(value));
    }
    Ok(Polynomial::new(coefficients))
}

// TESTS
// ================================================================================================

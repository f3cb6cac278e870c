use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use crate::{
    LOG_N, MODULUS, N, PK_LEN,
    error::FalconError,
    math::{FalconFelt, Polynomial},
    signature::Signature,
    utils::{
        ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable,
        bytes_to_hex_string, hex_to_bytes,
    },
};

// CONSTANTS
// ================================================================================================

/// The packed coefficients without the header byte: 1024 values of 14 bits each.
const PK_BODY_LEN: usize = PK_LEN - 1;

// PUBLIC KEY
// ================================================================================================

/// A public key: the polynomial h = g / f over Z_q.
///
/// Coefficients are held as the raw 14-bit values carried on the wire, so that decoding and
/// re-encoding a key reproduces it byte for byte. They are reduced modulo q only when the
/// polynomial form is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    coefficients: Vec<u16>,
}

impl PublicKey {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Wraps the public polynomial h.
    pub(crate) fn from_polynomial(h: &Polynomial<FalconFelt>) -> Self {
        Self {
            coefficients: h.coefficients.iter().map(|c| c.value()).collect(),
        }
    }

    /// Decodes a public key from its packed form.
    ///
    /// Both the bare 1792-byte coefficient body and the 1793-byte form with a leading header
    /// byte are accepted; the header byte, when present, is transport framing and is ignored
    /// here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FalconError> {
        let body = match bytes.len() {
            PK_BODY_LEN => bytes,
            PK_LEN => &bytes[1..],
            actual => return Err(FalconError::InvalidKeyLength { expected: PK_LEN, actual }),
        };
        Ok(Self { coefficients: unpack_coefficients(body) })
    }

    /// Parses a public key from its 0x-prefixed hex transport form.
    pub fn from_hex(value: &str) -> Result<Self, DeserializationError> {
        let bytes = hex_to_bytes(value, PK_LEN)
            .map_err(|err| DeserializationError::InvalidValue(err.to_string()))?;
        Self::read_from_bytes(&bytes)
    }

    // ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the key as the polynomial h with coefficients reduced modulo q.
    pub fn to_polynomial(&self) -> Polynomial<FalconFelt> {
        Polynomial::new(
            self.coefficients
                .iter()
                .map(|&c| FalconFelt::new(c % MODULUS as u16))
                .collect(),
        )
    }

    /// Renders the serialized key as a 0x-prefixed hex string.
    pub fn to_hex(&self) -> String {
        bytes_to_hex_string(&self.to_bytes())
    }

    // SIGNATURE VERIFICATION
    // --------------------------------------------------------------------------------------------

    /// Verifies a signature over `message` bound to `domain` under this key.
    pub fn verify(&self, domain: &[u8], message: &[u8], signature: &Signature) -> bool {
        signature.verify(domain, message, &self.to_polynomial())
    }
}

// SERIALIZATION / DESERIALIZATION
// ================================================================================================

impl Serializable for PublicKey {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u8(LOG_N);
        target.write_bytes(&pack_coefficients(&self.coefficients));
    }
}

impl Deserializable for PublicKey {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let header = source.read_u8()?;
        if header != LOG_N {
            return Err(DeserializationError::InvalidValue(format!(
                "public key header byte {header} does not encode log2({N})"
            )));
        }
        let body: [u8; PK_BODY_LEN] = source.read_array()?;
        Ok(Self { coefficients: unpack_coefficients(&body) })
    }
}

// HELPER FUNCTIONS
// ================================================================================================

/// Packs 14-bit coefficients into bytes, least significant bits first. For 1024 coefficients
/// the bit count is a multiple of 8, so the accumulator always drains completely.
fn pack_coefficients(coefficients: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(PK_BODY_LEN);
    let mut acc = 0u32;
    let mut acc_bits = 0u32;
    for &c in coefficients {
        acc |= (c as u32) << acc_bits;
        acc_bits += 14;
        while acc_bits >= 8 {
            bytes.push(acc as u8);
            acc >>= 8;
            acc_bits -= 8;
        }
    }
    bytes
}

fn unpack_coefficients(body: &[u8]) -> Vec<u16> {
    let mut coefficients = Vec::with_capacity(N);
    let mut acc = 0u32;
    let mut acc_bits = 0u32;
    for &byte in body {
        acc |= (byte as u32) << acc_bits;
        acc_bits += 8;
        if acc_bits >= 14 {
            coefficients.push((acc & 0x3fff) as u16);
            acc >>= 14;
            acc_bits -= 14;
        }
    }
    coefficients
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::{
        Deserializable, FalconError, MODULUS, N, PK_BODY_LEN, PK_LEN, PublicKey, Serializable,
    };

    fn key_from_values(values: Vec<u16>) -> PublicKey {
        PublicKey { coefficients: values }
    }

    #[test]
    fn references_serialize_through_the_blanket_impl() {
        fn encode<T: Serializable>(value: T) -> Vec<u8> {
            value.to_bytes()
        }
        let key = key_from_values(vec![7; N]);
        assert_eq!(encode(&key), encode(key.clone()));
    }

    #[test]
    fn encoded_key_has_the_advertised_length() {
        let key = key_from_values(vec![0x1fff; N]);
        let bytes = key.to_bytes();
        assert_eq!(bytes.len(), PK_LEN);
        assert_eq!(bytes[0], super::LOG_N);
    }

    #[test]
    fn decode_accepts_both_framings() {
        let key = key_from_values((0..N as u16).map(|i| i % (1 << 14)).collect());
        let bytes = key.to_bytes();

        let with_header = PublicKey::from_bytes(&bytes).unwrap();
        let without_header = PublicKey::from_bytes(&bytes[1..]).unwrap();
        assert_eq!(with_header, key);
        assert_eq!(without_header, key);

        assert_matches!(
            PublicKey::from_bytes(&bytes[2..]),
            Err(FalconError::InvalidKeyLength { expected: PK_LEN, actual }) if actual == PK_BODY_LEN - 1
        );
    }

    #[test]
    fn strict_decoding_validates_the_header_byte() {
        let key = key_from_values(vec![12345; N]);
        let mut bytes = key.to_bytes();
        assert_eq!(PublicKey::read_from_bytes(&bytes).unwrap(), key);

        bytes[0] = 9;
        assert!(PublicKey::read_from_bytes(&bytes).is_err());
    }

    #[test]
    fn to_polynomial_reduces_modulo_q() {
        let raw = (MODULUS as u16) + 5;
        let key = key_from_values(vec![raw; N]);
        let h = key.to_polynomial();
        assert!(h.coefficients.iter().all(|c| c.value() == 5));
    }

    #[test]
    fn hex_transport_roundtrip() {
        let key = key_from_values((0..N as u16).map(|i| (i * 11) % (1 << 14)).collect());
        let hex = key.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 2 * PK_LEN + 2);
        assert_eq!(PublicKey::from_hex(&hex).unwrap(), key);
    }

    proptest! {
        #[test]
        fn packing_roundtrips_any_14_bit_values(
            values in prop::collection::vec(0u16..(1 << 14), N),
            header in any::<u8>(),
        ) {
            let key = key_from_values(values);
            let bytes = key.to_bytes();
            prop_assert_eq!(PublicKey::from_bytes(&bytes).unwrap(), key.clone());
            // Re-encoding reproduces the wire form byte for byte.
            prop_assert_eq!(PublicKey::read_from_bytes(&bytes).unwrap().to_bytes(), bytes.clone());

            // The lenient decoder treats the header byte as framing: any value is skipped and
            // the result equals decoding the bare body.
            let mut reframed = bytes;
            reframed[0] = header;
            prop_assert_eq!(
                PublicKey::from_bytes(&reframed).unwrap(),
                PublicKey::from_bytes(&reframed[1..]).unwrap()
            );
        }
    }
}

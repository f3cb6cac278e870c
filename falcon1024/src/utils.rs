//! Hex helpers for the transport encoding of keys and signatures.

use alloc::{string::String, vec::Vec};
use core::fmt::Write;

use thiserror::Error;

pub use winter_utils::{
    ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable, SliceReader,
};

/// Renders a byte slice as hex into a String, with the customary 0x prefix.
pub fn bytes_to_hex_string(data: &[u8]) -> String {
    let mut s = String::with_capacity(2 * data.len() + 2);

    s.push_str("0x");
    for byte in data.iter() {
        write!(s, "{byte:02x}").expect("formatting hex failed");
    }

    s
}

/// Defines errors which can occur during parsing of hexadecimal strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HexParseError {
    #[error("expected hex data to have length {expected}, including the 0x prefix, found {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("hex encoded data must start with 0x prefix")]
    MissingPrefix,
    #[error("hex encoded data must contain only characters [0-9a-fA-F]")]
    InvalidChar,
}

/// Parses a hex string into a byte vector of known size.
pub fn hex_to_bytes(value: &str, num_bytes: usize) -> Result<Vec<u8>, HexParseError> {
    let expected: usize = (num_bytes * 2) + 2;
    if value.len() != expected {
        return Err(HexParseError::InvalidLength { expected, actual: value.len() });
    }

    if !value.starts_with("0x") {
        return Err(HexParseError::MissingPrefix);
    }

    let mut data = value.bytes().skip(2).map(|v| match v {
        b'0'..=b'9' => Ok(v - b'0'),
        b'a'..=b'f' => Ok(v - b'a' + 10),
        b'A'..=b'F' => Ok(v - b'A' + 10),
        _ => Err(HexParseError::InvalidChar),
    });

    let mut decoded = alloc::vec![0u8; num_bytes];
    for byte in decoded.iter_mut() {
        // These `unwrap` calls are okay because the length was checked above
        let high: u8 = data.next().unwrap()?;
        let low: u8 = data.next().unwrap()?;
        *byte = (high << 4) + low;
    }

    Ok(decoded)
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::{HexParseError, bytes_to_hex_string, hex_to_bytes};

    #[test]
    fn hex_roundtrip() {
        let bytes = [0u8, 1, 0xab, 0xff, 16];
        let hex = bytes_to_hex_string(&bytes);
        assert_eq!(hex, "0x0001abff10");
        assert_eq!(hex_to_bytes(&hex, 5).unwrap(), bytes);
    }

    #[test]
    fn hex_rejects_malformed_input() {
        assert_matches!(hex_to_bytes("0x00", 5), Err(HexParseError::InvalidLength { .. }));
        assert_matches!(hex_to_bytes("000001abff10", 5), Err(HexParseError::MissingPrefix));
        assert_matches!(hex_to_bytes("0x0001abfg10", 5), Err(HexParseError::InvalidChar));
        // Uppercase is accepted.
        assert_eq!(hex_to_bytes("0x0001ABFF10", 5).unwrap(), [0u8, 1, 0xab, 0xff, 16]);
    }
}

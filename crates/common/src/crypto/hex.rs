//! Hexadecimal transport encoding
//!
//! Everything that crosses the public record is hex-encoded with a `0x` prefix:
//! message envelopes, secret handles, identities. Decoding accepts both plain
//! and `0x`-prefixed input and is the exact inverse of encoding.

/// Errors that can occur while decoding hex input
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum HexError {
    /// Input has odd length or contains non-hex characters
    #[error("invalid hex encoding: {0}")]
    InvalidEncoding(String),
}

/// Strip an optional "0x" prefix from a hex string
pub fn strip_0x(hex: &str) -> &str {
    hex.strip_prefix("0x").unwrap_or(hex)
}

/// Encode bytes as a "0x"-prefixed lowercase hex string
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode an optionally "0x"-prefixed hex string into bytes
///
/// # Errors
///
/// Returns [`HexError::InvalidEncoding`] if the input (after prefix stripping)
/// has odd length or contains characters outside `[0-9a-fA-F]`.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, HexError> {
    let normalized = strip_0x(hex);
    if normalized.len() % 2 != 0 {
        return Err(HexError::InvalidEncoding(format!(
            "odd length {}",
            normalized.len()
        )));
    }
    hex::decode(normalized).map_err(|e| HexError::InvalidEncoding(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let bytes = vec![0x00, 0x01, 0xab, 0xff];
        let encoded = bytes_to_hex(&bytes);
        assert_eq!(encoded, "0x0001abff");
        assert_eq!(hex_to_bytes(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_empty_roundtrip() {
        assert_eq!(bytes_to_hex(&[]), "0x");
        assert_eq!(hex_to_bytes("0x").unwrap(), Vec::<u8>::new());
        assert_eq!(hex_to_bytes("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_accepts_unprefixed() {
        assert_eq!(hex_to_bytes("deadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(
            hex_to_bytes("0xdeadbeef").unwrap(),
            vec![0xde, 0xad, 0xbe, 0xef]
        );
    }

    #[test]
    fn test_odd_length_rejected() {
        assert!(matches!(
            hex_to_bytes("0xabc"),
            Err(HexError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_non_hex_rejected() {
        assert!(matches!(
            hex_to_bytes("0xzz11"),
            Err(HexError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_mixed_case() {
        assert_eq!(hex_to_bytes("0xDeAdBeEf").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }
}

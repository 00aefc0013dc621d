//! Envelope byte layouts
//!
//! ```text
//! legacy: [12 bytes: nonce][ciphertext || tag]
//! salted: [16 bytes: salt][12 bytes: nonce][ciphertext || tag]
//! ```
//!
//! Fixed-width fields only, so there is no length prefix. The codec cannot
//! tell a corrupted ciphertext from a good one; that is the tag's job.

use serde::{Deserialize, Serialize};

use crate::cipher::Nonce;
use crate::error::CryptoError;
use crate::{NONCE_SIZE, SALT_SIZE};

/// Which layout an envelope uses. Not recorded in the bytes themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeScheme {
    /// Fixed shared salt, `nonce || ciphertext`
    Legacy,
    /// Random per-file salt, `salt || nonce || ciphertext`
    #[default]
    Salted,
}

impl EnvelopeScheme {
    /// Bytes preceding the ciphertext
    pub fn header_len(&self) -> usize {
        match self {
            EnvelopeScheme::Legacy => NONCE_SIZE,
            EnvelopeScheme::Salted => SALT_SIZE + NONCE_SIZE,
        }
    }
}

impl std::str::FromStr for EnvelopeScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(EnvelopeScheme::Legacy),
            "salted" => Ok(EnvelopeScheme::Salted),
            other => Err(format!("unknown envelope scheme '{other}' (expected salted or legacy)")),
        }
    }
}

impl std::fmt::Display for EnvelopeScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeScheme::Legacy => f.write_str("legacy"),
            EnvelopeScheme::Salted => f.write_str("salted"),
        }
    }
}

/// Legacy layout: `nonce || ciphertext`.
pub fn encode(nonce: &Nonce, ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(nonce.as_bytes());
    out.extend_from_slice(ciphertext);
    out
}

/// Split a legacy envelope at byte 12.
///
/// Anything shorter than a nonce is `Format { reason: "too short" }`; exactly
/// 12 bytes yields an empty ciphertext (which the tag check will reject).
pub fn decode(envelope: &[u8]) -> Result<(Nonce, &[u8]), CryptoError> {
    if envelope.len() < NONCE_SIZE {
        return Err(CryptoError::Format { reason: "too short" });
    }
    let (nonce_bytes, ciphertext) = envelope.split_at(NONCE_SIZE);
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(nonce_bytes);
    Ok((Nonce::from_bytes(nonce), ciphertext))
}

/// Salted layout: `salt || nonce || ciphertext`.
pub fn encode_salted(salt: &[u8; SALT_SIZE], nonce: &Nonce, ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(salt);
    out.extend_from_slice(nonce.as_bytes());
    out.extend_from_slice(ciphertext);
    out
}

/// Split a salted envelope into salt, nonce and ciphertext.
pub fn decode_salted(envelope: &[u8]) -> Result<([u8; SALT_SIZE], Nonce, &[u8]), CryptoError> {
    if envelope.len() < SALT_SIZE + NONCE_SIZE {
        return Err(CryptoError::Format { reason: "too short" });
    }
    let (salt_bytes, rest) = envelope.split_at(SALT_SIZE);
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(salt_bytes);
    let (nonce, ciphertext) = decode(rest)?;
    Ok((salt, nonce, ciphertext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_rejects_11_bytes() {
        for len in 0..NONCE_SIZE {
            let input = vec![0u8; len];
            let result = decode(&input);
            assert!(
                matches!(result, Err(CryptoError::Format { reason: "too short" })),
                "length {len} must be rejected"
            );
        }
    }

    #[test]
    fn test_decode_exactly_12_bytes() {
        let raw: Vec<u8> = (0u8..12).collect();
        let (nonce, ciphertext) = decode(&raw).unwrap();
        assert_eq!(nonce.as_bytes().as_slice(), raw.as_slice());
        assert!(ciphertext.is_empty());
    }

    #[test]
    fn test_encode_layout() {
        let nonce = Nonce::from_bytes([0xAA; NONCE_SIZE]);
        let envelope = encode(&nonce, b"ct");
        assert_eq!(envelope.len(), 14);
        assert_eq!(&envelope[..12], &[0xAA; 12]);
        assert_eq!(&envelope[12..], b"ct");
    }

    #[test]
    fn test_salted_layout() {
        let salt = [0x11; SALT_SIZE];
        let nonce = Nonce::from_bytes([0x22; NONCE_SIZE]);
        let envelope = encode_salted(&salt, &nonce, b"xyz");

        assert_eq!(&envelope[..16], &[0x11; 16]);
        assert_eq!(&envelope[16..28], &[0x22; 12]);
        assert_eq!(&envelope[28..], b"xyz");

        let (s, n, ct) = decode_salted(&envelope).unwrap();
        assert_eq!(s, salt);
        assert_eq!(n, nonce);
        assert_eq!(ct, b"xyz");
    }

    #[test]
    fn test_decode_salted_boundary() {
        assert!(matches!(
            decode_salted(&[0u8; 27]),
            Err(CryptoError::Format { .. })
        ));
        let (_, _, ct) = decode_salted(&[0u8; 28]).unwrap();
        assert!(ct.is_empty());
    }

    #[test]
    fn test_scheme_parse_and_display() {
        assert_eq!("salted".parse::<EnvelopeScheme>().unwrap(), EnvelopeScheme::Salted);
        assert_eq!(" Legacy ".parse::<EnvelopeScheme>().unwrap(), EnvelopeScheme::Legacy);
        assert!("v2".parse::<EnvelopeScheme>().is_err());
        assert_eq!(EnvelopeScheme::Legacy.to_string(), "legacy");
        assert_eq!(EnvelopeScheme::default(), EnvelopeScheme::Salted);
    }

    #[test]
    fn test_header_len() {
        assert_eq!(EnvelopeScheme::Legacy.header_len(), 12);
        assert_eq!(EnvelopeScheme::Salted.header_len(), 28);
    }

    proptest! {
        #[test]
        fn split_point_is_always_twelve(data in proptest::collection::vec(any::<u8>(), 12..=512)) {
            let (nonce, ct) = decode(&data).unwrap();
            prop_assert_eq!(nonce.as_bytes().as_slice(), &data[..12]);
            prop_assert_eq!(ct, &data[12..]);
            prop_assert_eq!(encode(&nonce, ct), data);
        }
    }
}

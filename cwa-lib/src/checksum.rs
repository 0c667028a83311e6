//! Integrity verification for uploaded packets.
//!
//! Every packet ends with a SHA-256 digest of all bytes before it. The server
//! recomputes that digest and sends its own value back as the acknowledgment,
//! so the device can tell a corrupted upload from an accepted one even when
//! the structure decoded fine.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::constants::CHECKSUM_SIZE;
use crate::error::{CwaError, Section};

/// A 32-byte SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Checksum(pub [u8; CHECKSUM_SIZE]);

impl Checksum {
    pub fn as_bytes(&self) -> &[u8; CHECKSUM_SIZE] {
        &self.0
    }

    /// Build a checksum from a slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CwaError> {
        let array: [u8; CHECKSUM_SIZE] = bytes.try_into().map_err(|_| CwaError::Truncated {
            section: Section::Checksum,
            offset: 0,
            needed: CHECKSUM_SIZE,
            available: bytes.len(),
        })?;
        Ok(Self(array))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", self)
    }
}

impl AsRef<[u8]> for Checksum {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let mut out = [0u8; CHECKSUM_SIZE];
        hex::decode_to_slice(&text, &mut out).map_err(serde::de::Error::custom)?;
        Ok(Self(out))
    }
}

/// SHA-256 over `body`.
pub fn compute(body: &[u8]) -> Checksum {
    let digest = Sha256::digest(body);
    let mut out = [0u8; CHECKSUM_SIZE];
    out.copy_from_slice(&digest);
    Checksum(out)
}

/// Split a packet buffer into the covered body and the received trailer.
pub fn split(buffer: &[u8]) -> Result<(&[u8], Checksum), CwaError> {
    let checksum_offset = buffer.len().checked_sub(CHECKSUM_SIZE).ok_or(CwaError::Truncated {
        section: Section::Checksum,
        offset: 0,
        needed: CHECKSUM_SIZE,
        available: buffer.len(),
    })?;
    let (body, trailer) = buffer.split_at(checksum_offset);
    Ok((body, Checksum::from_slice(trailer)?))
}

/// The digest the server acknowledges with: computed over the body,
/// independent of whether it matches the trailer.
pub fn acknowledgment(buffer: &[u8]) -> Result<Checksum, CwaError> {
    let (body, _) = split(buffer)?;
    Ok(compute(body))
}

/// Check the trailing digest of `buffer` against the bytes it covers.
///
/// Returns the computed digest on success. On mismatch both digests are
/// carried in the error.
pub fn verify(buffer: &[u8]) -> Result<Checksum, CwaError> {
    let (body, received) = split(buffer)?;
    let computed = compute(body);
    trace!(%computed, %received, body_len = body.len(), "verifying checksum");

    if computed.0 != received.0 {
        return Err(CwaError::ChecksumMismatch { computed, received });
    }
    Ok(computed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_known_vector() {
        // SHA-256("abc")
        assert_eq!(
            compute(b"abc").to_string(),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
    }

    #[test]
    fn test_verify_accepts_matching_trailer() {
        let mut buffer = b"hello".to_vec();
        buffer.extend_from_slice(compute(b"hello").as_bytes());
        assert_eq!(verify(&buffer).unwrap(), compute(b"hello"));
    }

    #[test]
    fn test_verify_reports_both_digests() {
        let mut buffer = b"hello".to_vec();
        buffer.extend_from_slice(&[0u8; CHECKSUM_SIZE]);
        match verify(&buffer) {
            Err(CwaError::ChecksumMismatch { computed, received }) => {
                assert_eq!(computed, compute(b"hello"));
                assert_eq!(received, Checksum::default());
            }
            other => panic!("Expected ChecksumMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_acknowledgment_ignores_trailer() {
        let mut buffer = b"payload".to_vec();
        buffer.extend_from_slice(&[0xAA; CHECKSUM_SIZE]);
        assert_eq!(acknowledgment(&buffer).unwrap(), compute(b"payload"));
    }

    #[test]
    fn test_split_too_short() {
        assert!(matches!(
            split(&[0u8; CHECKSUM_SIZE - 1]),
            Err(CwaError::Truncated {
                section: Section::Checksum,
                needed: CHECKSUM_SIZE,
                available: 31,
                ..
            })
        ));
    }

    #[test]
    fn test_serde_hex_form() {
        let checksum = compute(b"abc");
        let json = serde_json::to_string(&checksum).unwrap();
        assert_eq!(json, format!("\"{}\"", checksum));
        let back: Checksum = serde_json::from_str(&json).unwrap();
        assert_eq!(back, checksum);
    }
}

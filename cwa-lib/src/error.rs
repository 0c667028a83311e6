use crate::checksum::Checksum;
use strum_macros::Display;
use thiserror::Error;

/// Region of the packet a decode or encode error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Section {
    #[strum(to_string = "packet header")]
    PacketHeader,
    #[strum(to_string = "frame header")]
    FrameHeader,
    #[strum(to_string = "wifi records")]
    Wifi,
    #[strum(to_string = "beacon records")]
    Beacon,
    #[strum(to_string = "frame list")]
    Frames,
    #[strum(to_string = "checksum")]
    Checksum,
}

/// The primary error type for the `cwa-lib` crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CwaError {
    #[error("Truncated {section} at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        section: Section,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Bad magic: expected 435741, got {}", hex::encode_upper(found))]
    BadMagic { found: [u8; 3] },

    #[error("Trailing garbage: {remaining} unconsumed bytes at offset {offset}")]
    TrailingGarbage { offset: usize, remaining: usize },

    #[error("Checksum mismatch: computed {computed}, received {received}")]
    ChecksumMismatch { computed: Checksum, received: Checksum },

    #[error("Count mismatch in {section}: header declares {declared}, found {actual}")]
    CountMismatch {
        section: Section,
        declared: usize,
        actual: usize,
    },
}

impl CwaError {
    /// Stable short name of the failure kind, used in logs and HTTP replies.
    pub fn kind(&self) -> &'static str {
        match self {
            CwaError::Truncated { .. } => "truncated",
            CwaError::BadMagic { .. } => "bad_magic",
            CwaError::TrailingGarbage { .. } => "trailing_garbage",
            CwaError::ChecksumMismatch { .. } => "checksum_mismatch",
            CwaError::CountMismatch { .. } => "count_mismatch",
        }
    }

    /// True for failures that mean the bytes are not a well-formed packet,
    /// as opposed to a well-formed packet damaged in transit.
    pub fn is_structural(&self) -> bool {
        !matches!(self, CwaError::ChecksumMismatch { .. })
    }
}

//! Packet codec.
//!
//! ```text
//! PacketHeader (7):  magic[3] | version u8 | client_id i16 | frame_count u8
//! Frame (repeated frame_count times)
//!   FrameHeader (12): timestamp i32 | battery u16 | hall i16 | temperature i16
//!                     | wifi_count u8 | beacon_count u8
//!   Wifi (7, repeated wifi_count times):     mac[6] | rssi i8
//!   Beacon (21, repeated beacon_count times): data[20] | rssi i8
//! Checksum (32): SHA-256 over every preceding byte
//! ```
//!
//! All integers are big-endian. Sections carry no lengths of their own, only
//! counts, so the decoder walks the buffer with a bounds-checked cursor and
//! requires the frames to end exactly where the checksum begins.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};
use zerocopy::IntoBytes;

use crate::checksum::{self, Checksum};
use crate::constants::*;
use crate::cursor::Cursor;
use crate::error::{CwaError, Section};
use crate::frame::{Frame, count_field};
use crate::header::{PacketHeader, PacketHeaderRaw};

/// One upload from a scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub header: PacketHeader,
    pub frames: Vec<Frame>,
    /// Digest carried in the packet trailer
    pub checksum: Checksum,
}

impl Packet {
    /// Build a well-formed packet from frames and fill in its checksum.
    pub fn new(version: u8, client_id: i16, frames: Vec<Frame>) -> Result<Self, CwaError> {
        let frame_count = count_field(frames.len(), Section::Frames)?;
        let mut packet = Self {
            header: PacketHeader::new(version, client_id, frame_count),
            frames,
            checksum: Checksum::default(),
        };
        packet.checksum = checksum::compute(&packet.encode_body()?);
        Ok(packet)
    }

    /// Decode the structure of `buffer`.
    ///
    /// The trailing digest is captured but not verified; call
    /// [`checksum::verify`] or use [`Packet::decode_verified`] for that.
    pub fn decode(buffer: &[u8]) -> Result<Self, CwaError> {
        if buffer.len() < MIN_PACKET_SIZE {
            return Err(CwaError::Truncated {
                section: Section::PacketHeader,
                offset: 0,
                needed: MIN_PACKET_SIZE,
                available: buffer.len(),
            });
        }

        let checksum_offset = buffer.len() - CHECKSUM_SIZE;
        let (body, trailer) = buffer.split_at(checksum_offset);
        let mut cursor = Cursor::new(body);

        let header = PacketHeader::from(cursor.read::<PacketHeaderRaw>(Section::PacketHeader)?);
        if !header.has_valid_magic() {
            return Err(CwaError::BadMagic { found: header.magic });
        }
        trace!(
            version = header.version,
            client_id = header.client_id,
            frame_count = header.frame_count,
            "decoded packet header"
        );

        let mut frames = Vec::with_capacity(header.frame_count as usize);
        for _ in 0..header.frame_count {
            frames.push(Frame::decode(&mut cursor)?);
        }

        if cursor.remaining() != 0 {
            return Err(CwaError::TrailingGarbage {
                offset: cursor.position(),
                remaining: cursor.remaining(),
            });
        }

        let packet = Self {
            header,
            frames,
            checksum: Checksum::from_slice(trailer)?,
        };
        debug!(
            client_id = packet.header.client_id,
            frames = packet.frames.len(),
            observations = packet.observation_count(),
            bytes = buffer.len(),
            "decoded packet"
        );
        Ok(packet)
    }

    /// Decode and then verify the trailing digest.
    ///
    /// Returns the packet together with the digest the server computed.
    pub fn decode_verified(buffer: &[u8]) -> Result<(Self, Checksum), CwaError> {
        let packet = Self::decode(buffer)?;
        let computed = checksum::verify(buffer)?;
        Ok((packet, computed))
    }

    /// Serialize the packet and append a freshly computed digest.
    ///
    /// The stored `checksum` field is ignored. Fails if any header count
    /// disagrees with the list it describes.
    pub fn encode(&self) -> Result<Bytes, CwaError> {
        let mut buf = self.encode_body()?;
        let digest = checksum::compute(&buf);
        buf.put_slice(digest.as_bytes());
        Ok(buf.freeze())
    }

    fn encode_body(&self) -> Result<BytesMut, CwaError> {
        if self.header.frame_count as usize != self.frames.len() {
            return Err(CwaError::CountMismatch {
                section: Section::Frames,
                declared: self.header.frame_count as usize,
                actual: self.frames.len(),
            });
        }

        let mut buf = BytesMut::with_capacity(self.wire_size());
        buf.put_slice(PacketHeaderRaw::from(self.header).as_bytes());
        for frame in &self.frames {
            frame.encode_into(&mut buf)?;
        }
        Ok(buf)
    }

    /// Size of the encoded packet including the digest
    pub fn wire_size(&self) -> usize {
        PACKET_HEADER_SIZE + self.frames.iter().map(Frame::wire_size).sum::<usize>() + CHECKSUM_SIZE
    }

    /// Wifi plus beacon observations across all frames
    pub fn observation_count(&self) -> usize {
        self.frames.iter().map(|f| f.wifis.len() + f.beacons.len()).sum()
    }
}

impl TryFrom<&[u8]> for Packet {
    type Error = CwaError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        Packet::decode(buffer)
    }
}

impl TryFrom<Bytes> for Packet {
    type Error = CwaError;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        Packet::decode(&bytes)
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "Frame #{}: {}", i, frame)?;
        }
        write!(f, "Checksum: {}", self.checksum)
    }
}

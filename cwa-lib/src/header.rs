use chrono::{DateTime, Utc};
use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use zerocopy::byteorder::big_endian::{I16, I32, U16};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::constants::*;

/// Version byte of the packet header.
///
/// Only recorded, never used to pick a decoder: every accepted packet uses the
/// same layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum ProtocolVersion {
    V1 = 1,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V1 => write!(f, "v1"),
            ProtocolVersion::Unknown(v) => write!(f, "unknown ({})", v),
        }
    }
}

/// Packet header as laid out on the wire (7 bytes, big-endian)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct PacketHeaderRaw {
    pub magic: [u8; 3],
    pub version: u8,
    pub client_id: I16,
    pub frame_count: u8,
}

/// Frame header as laid out on the wire (12 bytes, big-endian)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct FrameHeaderRaw {
    pub timestamp: I32,   // Seconds since unix epoch
    pub battery: U16,     // Raw ADC reading of the battery divider
    pub hall: I16,        // Raw hall sensor
    pub temperature: I16, // Raw die temperature, Fahrenheit
    pub wifi_count: u8,
    pub beacon_count: u8,
}

const _: () = assert!(size_of::<PacketHeaderRaw>() == PACKET_HEADER_SIZE);
const _: () = assert!(size_of::<FrameHeaderRaw>() == FRAME_HEADER_SIZE);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketHeader {
    pub magic: [u8; 3],
    pub version: u8,
    pub client_id: i16,
    pub frame_count: u8,
}

impl PacketHeader {
    pub fn new(version: u8, client_id: i16, frame_count: u8) -> Self {
        Self {
            magic: MAGIC,
            version,
            client_id,
            frame_count,
        }
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        ProtocolVersion::from_primitive(self.version)
    }

    pub fn has_valid_magic(&self) -> bool {
        self.magic == MAGIC
    }
}

impl From<PacketHeaderRaw> for PacketHeader {
    fn from(raw: PacketHeaderRaw) -> Self {
        Self {
            magic: raw.magic,
            version: raw.version,
            client_id: raw.client_id.get(),
            frame_count: raw.frame_count,
        }
    }
}

impl From<PacketHeader> for PacketHeaderRaw {
    fn from(header: PacketHeader) -> Self {
        Self {
            magic: header.magic,
            version: header.version,
            client_id: I16::new(header.client_id),
            frame_count: header.frame_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub timestamp: i32,
    pub battery: u16,
    pub hall: i16,
    pub temperature: i16,
    pub wifi_count: u8,
    pub beacon_count: u8,
}

impl FrameHeader {
    /// Wakeup time of the scan, `None` if the timestamp is out of chrono's range
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp as i64, 0)
    }

    /// Die temperature converted from the raw Fahrenheit reading
    pub fn temperature_celsius(&self) -> f64 {
        (self.temperature as f64 - 32.0) / 1.8
    }

    /// Bytes of observation records that follow this header on the wire
    pub fn records_size(&self) -> usize {
        self.wifi_count as usize * WIFI_RECORD_SIZE
            + self.beacon_count as usize * BEACON_RECORD_SIZE
    }
}

impl From<FrameHeaderRaw> for FrameHeader {
    fn from(raw: FrameHeaderRaw) -> Self {
        Self {
            timestamp: raw.timestamp.get(),
            battery: raw.battery.get(),
            hall: raw.hall.get(),
            temperature: raw.temperature.get(),
            wifi_count: raw.wifi_count,
            beacon_count: raw.beacon_count,
        }
    }
}

impl From<FrameHeader> for FrameHeaderRaw {
    fn from(header: FrameHeader) -> Self {
        Self {
            timestamp: I32::new(header.timestamp),
            battery: U16::new(header.battery),
            hall: I16::new(header.hall),
            temperature: I16::new(header.temperature),
            wifi_count: header.wifi_count,
            beacon_count: header.beacon_count,
        }
    }
}

impl fmt::Display for PacketHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Magic: {}, Version: {}, Client ID: {}, Frames: {}",
            String::from_utf8_lossy(&self.magic),
            self.protocol_version(),
            self.client_id,
            self.frame_count
        )
    }
}

impl fmt::Display for FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.recorded_at() {
            Some(at) => write!(f, "Time: {}", at.format("%Y-%m-%d %H:%M:%S UTC"))?,
            None => write!(f, "Time: {} (out of range)", self.timestamp)?,
        }
        write!(
            f,
            ", Battery: {}, Hall: {}, Temp: {:.1} °C, Wifis: {}, Beacons: {}",
            self.battery,
            self.hall,
            self.temperature_celsius(),
            self.wifi_count,
            self.beacon_count
        )
    }
}

//! JSON description of a packet, used to generate test uploads.
//!
//! ```json
//! {
//!   "client_id": 1337,
//!   "frames": [
//!     {
//!       "timestamp": 1600000000,
//!       "battery": 3900,
//!       "wifis": [{ "macAddress": "AA:BB:CC:DD:EE:FF", "signalStrength": -60 }],
//!       "beacons": [{ "data": "00112233445566778899AABBCCDDEEFF00112233", "signalStrength": -80 }]
//!     }
//!   ]
//! }
//! ```

use anyhow::Result;
use cwa_lib::constants::CURRENT_VERSION;
use cwa_lib::{BeaconObservation, Frame, Packet, WifiObservation};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PacketSpec {
    #[serde(default = "current_version")]
    pub version: u8,
    pub client_id: i16,
    #[serde(default)]
    pub frames: Vec<FrameSpec>,
}

#[derive(Debug, Deserialize)]
pub struct FrameSpec {
    pub timestamp: i32,
    #[serde(default)]
    pub battery: u16,
    #[serde(default)]
    pub hall: i16,
    #[serde(default)]
    pub temperature: i16,
    #[serde(default)]
    pub wifis: Vec<WifiObservation>,
    #[serde(default)]
    pub beacons: Vec<BeaconObservation>,
}

fn current_version() -> u8 {
    CURRENT_VERSION
}

impl PacketSpec {
    pub fn into_packet(self) -> Result<Packet> {
        let frames = self
            .frames
            .into_iter()
            .map(|f| Frame::new(f.timestamp, f.battery, f.hall, f.temperature, f.wifis, f.beacons))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Packet::new(self.version, self.client_id, frames)?)
    }
}

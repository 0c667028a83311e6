//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use cwa_lib::checksum::{self, Checksum};
#[allow(unused_imports)]
pub use cwa_lib::constants::*;
#[allow(unused_imports)]
pub use cwa_lib::{BeaconObservation, CwaError, Frame, Packet, Section, WifiObservation};

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Vec<u8> {
    hex::decode(hex_data.replace(' ', "")).expect("Failed to decode hex")
}

/// Append the SHA-256 of `body` so the result is a checksum-valid buffer
#[allow(dead_code)]
pub fn with_checksum(body: &[u8]) -> Vec<u8> {
    let mut buffer = body.to_vec();
    buffer.extend_from_slice(checksum::compute(body).as_bytes());
    buffer
}

/// Packet header: magic, version 1, client 1, one frame
#[allow(dead_code)]
pub const SINGLE_FRAME_HEADER: &str = "43574101000101";

/// Frame header at 2020-09-13T12:26:40Z, battery 0x0F00, hall -5, 98 F, one wifi, no beacons
#[allow(dead_code)]
pub const ONE_WIFI_FRAME_HEADER: &str = "5F5E1000 0F00 FFFB 0062 01 00";

/// Wifi record AA:BB:CC:DD:EE:01 at -67 dBm
#[allow(dead_code)]
pub const WIFI_RECORD: &str = "AABBCCDDEE01 BD";

/// Body of the single-frame, single-wifi packet (no checksum)
#[allow(dead_code)]
pub fn single_wifi_body() -> Vec<u8> {
    hex_to_bytes(&format!("{SINGLE_FRAME_HEADER}{ONE_WIFI_FRAME_HEADER}{WIFI_RECORD}"))
}

/// Single-frame packet with two wifis and one beacon, in a known order
#[allow(dead_code)]
pub fn two_wifi_one_beacon_body() -> Vec<u8> {
    let mut body = hex_to_bytes(SINGLE_FRAME_HEADER);
    body.extend(hex_to_bytes("5F5E1000 0F00 0000 0062 02 01"));
    body.extend(hex_to_bytes("111111111111 C0"));
    body.extend(hex_to_bytes("222222222222 B0"));
    body.extend([0x5A; BEACON_DATA_SIZE]);
    body.push(0xA6);
    body
}

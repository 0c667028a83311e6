// Wire constants for the CWA scanner upload protocol

/// Protocol family marker at the start of every packet ("CWA")
pub const MAGIC: [u8; 3] = [0x43, 0x57, 0x41];

/// Size of the packet header (7 bytes)
pub const PACKET_HEADER_SIZE: usize = 7;

/// Size of a frame header (12 bytes)
pub const FRAME_HEADER_SIZE: usize = 12;

/// Size of one wifi observation record (7 bytes)
pub const WIFI_RECORD_SIZE: usize = 7;

/// Size of one beacon observation record (21 bytes)
pub const BEACON_RECORD_SIZE: usize = 21;

/// Size of the trailing SHA-256 digest (32 bytes)
pub const CHECKSUM_SIZE: usize = 32;

/// Smallest buffer that can hold a packet: header plus digest, zero frames
pub const MIN_PACKET_SIZE: usize = PACKET_HEADER_SIZE + CHECKSUM_SIZE;

/// Length of a hardware address
pub const MAC_ADDRESS_SIZE: usize = 6;

/// Length of the opaque beacon advertisement payload
pub const BEACON_DATA_SIZE: usize = 20;

/// Upper bound for every count field (they are all u8 on the wire)
pub const MAX_RECORDS: usize = u8::MAX as usize;

/// Protocol version written by current firmware
pub const CURRENT_VERSION: u8 = 1;

pub mod checksum;
pub mod constants;
mod cursor;
pub mod error;
pub mod frame;
pub mod header;
pub mod observation;
pub mod packet;

pub use checksum::Checksum;
pub use error::{CwaError, Section};
pub use frame::Frame;
pub use header::{FrameHeader, PacketHeader, ProtocolVersion};
pub use observation::{BeaconData, BeaconObservation, MacAddress, WifiObservation};
pub use packet::Packet;

use cwa_lib::checksum::{self, Checksum};
use cwa_lib::Packet;
use tracing::{info, warn};

use crate::error::IngestError;
use crate::store::{FrameStore, StoreReceipt};

/// Result of an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Digest computed by the server, sent back as the acknowledgment
    pub checksum: Checksum,
    pub client_id: i16,
    pub receipt: StoreReceipt,
}

/// Decode, verify and persist one request body.
///
/// The store is only touched once both the structure and the digest check out.
pub fn process(store: &dyn FrameStore, body: &[u8]) -> Result<IngestOutcome, IngestError> {
    let packet = Packet::decode(body).inspect_err(|e| {
        warn!(kind = e.kind(), bytes = body.len(), "Rejected malformed packet: {}", e);
    })?;

    let computed = checksum::verify(body).inspect_err(|e| {
        warn!(
            kind = e.kind(),
            client_id = packet.header.client_id,
            "Rejected corrupted packet: {}",
            e
        );
    })?;

    let receipt = store.store_packet(&packet)?;
    info!(
        client_id = packet.header.client_id,
        version = packet.header.version,
        frames = receipt.frame_ids.len(),
        wifis = receipt.wifis,
        beacons = receipt.beacons,
        checksum = %computed,
        "Accepted packet"
    );

    Ok(IngestOutcome {
        checksum: computed,
        client_id: packet.header.client_id,
        receipt,
    })
}

//! Property tests for encode/decode and checksum integrity

mod common;

use common::*;
use proptest::collection::vec;
use proptest::prelude::*;

fn arb_wifi() -> impl Strategy<Value = WifiObservation> {
    (any::<[u8; 6]>(), any::<i8>()).prop_map(|(mac, rssi)| WifiObservation::new(mac, rssi))
}

fn arb_beacon() -> impl Strategy<Value = BeaconObservation> {
    (any::<[u8; 20]>(), any::<i8>()).prop_map(|(data, rssi)| BeaconObservation::new(data, rssi))
}

fn arb_frame() -> impl Strategy<Value = Frame> {
    (
        any::<i32>(),
        any::<u16>(),
        any::<i16>(),
        any::<i16>(),
        vec(arb_wifi(), 0..8),
        vec(arb_beacon(), 0..4),
    )
        .prop_map(|(timestamp, battery, hall, temperature, wifis, beacons)| {
            Frame::new(timestamp, battery, hall, temperature, wifis, beacons)
                .expect("counts fit in u8")
        })
}

fn arb_packet() -> impl Strategy<Value = Packet> {
    (any::<u8>(), any::<i16>(), vec(arb_frame(), 0..6))
        .prop_map(|(version, client_id, frames)| {
            Packet::new(version, client_id, frames).expect("counts fit in u8")
        })
}

proptest! {
    #[test]
    fn prop_decode_inverts_encode(packet in arb_packet()) {
        let bytes = packet.encode().unwrap();
        prop_assert_eq!(bytes.len(), packet.wire_size());

        let (decoded, computed) = Packet::decode_verified(&bytes).unwrap();
        prop_assert_eq!(&decoded.frames, &packet.frames);
        prop_assert_eq!(decoded.header, packet.header);
        prop_assert_eq!(computed, packet.checksum);
    }

    #[test]
    fn prop_single_byte_flip_is_detected(
        packet in arb_packet(),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let mut bytes = packet.encode().unwrap().to_vec();
        let body_len = bytes.len() - CHECKSUM_SIZE;
        let i = index.index(body_len);
        bytes[i] ^= flip;

        let verified = checksum::verify(&bytes);
        prop_assert!(
            matches!(verified, Err(CwaError::ChecksumMismatch { .. })),
            "expected checksum mismatch, got {:?}",
            verified
        );
        prop_assert!(Packet::decode_verified(&bytes).is_err());
        if Packet::decode(&bytes).is_ok() {
            prop_assert!(
                matches!(Packet::decode_verified(&bytes), Err(CwaError::ChecksumMismatch { .. })),
                "structurally valid corruption must surface as ChecksumMismatch"
            );
        }
    }

    #[test]
    fn prop_decode_never_panics(bytes in vec(any::<u8>(), 0..512)) {
        let _ = Packet::decode(&bytes);
        let _ = checksum::verify(&bytes);
    }

    #[test]
    fn prop_decode_never_panics_with_valid_prefix(tail in vec(any::<u8>(), 0..512)) {
        let mut bytes = MAGIC.to_vec();
        bytes.extend(tail);
        if let Ok(packet) = Packet::decode(&bytes) {
            prop_assert_eq!(packet.wire_size(), bytes.len());
        }
    }
}

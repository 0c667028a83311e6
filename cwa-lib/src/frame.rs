use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;
use zerocopy::IntoBytes;

use crate::constants::*;
use crate::cursor::Cursor;
use crate::error::{CwaError, Section};
use crate::header::{FrameHeader, FrameHeaderRaw};
use crate::observation::{BeaconObservation, BeaconRecordRaw, WifiObservation, WifiRecordRaw};

/// One wakeup cycle of a scanner: sensor readings plus everything it saw.
///
/// Observations keep their transmission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub header: FrameHeader,
    pub wifis: Vec<WifiObservation>,
    pub beacons: Vec<BeaconObservation>,
}

impl Frame {
    /// Build a frame whose counts match its observation lists.
    pub fn new(
        timestamp: i32,
        battery: u16,
        hall: i16,
        temperature: i16,
        wifis: Vec<WifiObservation>,
        beacons: Vec<BeaconObservation>,
    ) -> Result<Self, CwaError> {
        let header = FrameHeader {
            timestamp,
            battery,
            hall,
            temperature,
            wifi_count: count_field(wifis.len(), Section::Wifi)?,
            beacon_count: count_field(beacons.len(), Section::Beacon)?,
        };
        Ok(Self { header, wifis, beacons })
    }

    /// Size of this frame on the wire
    pub fn wire_size(&self) -> usize {
        FRAME_HEADER_SIZE
            + self.wifis.len() * WIFI_RECORD_SIZE
            + self.beacons.len() * BEACON_RECORD_SIZE
    }

    /// Check that the header counts describe the observation lists.
    pub fn validate(&self) -> Result<(), CwaError> {
        if self.header.wifi_count as usize != self.wifis.len() {
            return Err(CwaError::CountMismatch {
                section: Section::Wifi,
                declared: self.header.wifi_count as usize,
                actual: self.wifis.len(),
            });
        }
        if self.header.beacon_count as usize != self.beacons.len() {
            return Err(CwaError::CountMismatch {
                section: Section::Beacon,
                declared: self.header.beacon_count as usize,
                actual: self.beacons.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn decode(cursor: &mut Cursor<'_>) -> Result<Self, CwaError> {
        let start = cursor.position();
        let header = FrameHeader::from(cursor.read::<FrameHeaderRaw>(Section::FrameHeader)?);

        let wifis = cursor
            .read_array::<WifiRecordRaw>(header.wifi_count as usize, Section::Wifi)?
            .into_iter()
            .map(WifiObservation::from)
            .collect();
        let beacons = cursor
            .read_array::<BeaconRecordRaw>(header.beacon_count as usize, Section::Beacon)?
            .into_iter()
            .map(BeaconObservation::from)
            .collect();

        trace!(
            offset = start,
            timestamp = header.timestamp,
            wifis = header.wifi_count,
            beacons = header.beacon_count,
            "decoded frame"
        );
        Ok(Self { header, wifis, beacons })
    }

    pub(crate) fn encode_into(&self, buf: &mut BytesMut) -> Result<(), CwaError> {
        self.validate()?;
        buf.put_slice(FrameHeaderRaw::from(self.header).as_bytes());
        for wifi in &self.wifis {
            buf.put_slice(WifiRecordRaw::from(*wifi).as_bytes());
        }
        for beacon in &self.beacons {
            buf.put_slice(BeaconRecordRaw::from(*beacon).as_bytes());
        }
        Ok(())
    }
}

pub(crate) fn count_field(len: usize, section: Section) -> Result<u8, CwaError> {
    u8::try_from(len).map_err(|_| CwaError::CountMismatch {
        section,
        declared: MAX_RECORDS,
        actual: len,
    })
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        for wifi in &self.wifis {
            writeln!(f, "\tWifi {}", wifi)?;
        }
        for beacon in &self.beacons {
            writeln!(f, "\tBeacon {}", beacon)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_counts() {
        let frame = Frame::new(
            1_600_000_000,
            4000,
            -3,
            100,
            vec![WifiObservation::new([1; 6], -50), WifiObservation::new([2; 6], -60)],
            vec![BeaconObservation::new([3; 20], -80)],
        )
        .unwrap();
        assert_eq!(frame.header.wifi_count, 2);
        assert_eq!(frame.header.beacon_count, 1);
        assert_eq!(frame.wire_size(), 12 + 2 * 7 + 21);
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_new_rejects_too_many_wifis() {
        let wifis = vec![WifiObservation::new([0; 6], 0); 256];
        assert_eq!(
            Frame::new(0, 0, 0, 0, wifis, Vec::new()),
            Err(CwaError::CountMismatch {
                section: Section::Wifi,
                declared: 255,
                actual: 256
            })
        );
    }

    #[test]
    fn test_encode_rejects_inconsistent_counts() {
        let mut frame = Frame::new(0, 0, 0, 0, Vec::new(), Vec::new()).unwrap();
        frame.header.beacon_count = 2;
        let mut buf = BytesMut::new();
        assert!(matches!(
            frame.encode_into(&mut buf),
            Err(CwaError::CountMismatch {
                section: Section::Beacon,
                declared: 2,
                actual: 0
            })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_reads_wifis_before_beacons() {
        let frame = Frame::new(
            42,
            1,
            2,
            3,
            vec![WifiObservation::new([0xAA; 6], -1)],
            vec![BeaconObservation::new([0xBB; 20], -2)],
        )
        .unwrap();
        let mut buf = BytesMut::new();
        frame.encode_into(&mut buf).unwrap();
        assert_eq!(buf.len(), frame.wire_size());

        let mut cursor = Cursor::new(&buf);
        assert_eq!(Frame::decode(&mut cursor).unwrap(), frame);
        assert_eq!(cursor.remaining(), 0);
    }
}

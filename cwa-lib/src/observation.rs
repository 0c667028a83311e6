use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::constants::*;

/// Wifi observation as laid out on the wire (7 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct WifiRecordRaw {
    pub mac: [u8; MAC_ADDRESS_SIZE],
    pub rssi: i8,
}

/// Beacon observation as laid out on the wire (21 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BeaconRecordRaw {
    pub data: [u8; BEACON_DATA_SIZE],
    pub rssi: i8,
}

const _: () = assert!(size_of::<WifiRecordRaw>() == WIFI_RECORD_SIZE);
const _: () = assert!(size_of::<BeaconRecordRaw>() == BEACON_RECORD_SIZE);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseObservationError {
    #[error("Invalid MAC address {0:?}: expected six colon-separated hex octets")]
    MacAddress(String),

    #[error("Invalid beacon payload: {0}")]
    BeaconData(#[from] hex::FromHexError),
}

/// Hardware address of an access point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddress(pub [u8; MAC_ADDRESS_SIZE]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", octet)?;
        }
        Ok(())
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({})", self)
    }
}

impl FromStr for MacAddress {
    type Err = ParseObservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseObservationError::MacAddress(s.to_string());
        let octets: Vec<&str> = s.split(':').collect();
        if octets.len() != MAC_ADDRESS_SIZE || octets.iter().any(|octet| octet.len() != 2) {
            return Err(invalid());
        }
        let mut out = [0u8; MAC_ADDRESS_SIZE];
        hex::decode_to_slice(octets.concat(), &mut out).map_err(|_| invalid())?;
        Ok(Self(out))
    }
}

/// Opaque vendor advertisement payload of a proximity beacon.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BeaconData(pub [u8; BEACON_DATA_SIZE]);

impl fmt::Display for BeaconData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl fmt::Debug for BeaconData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeaconData({})", self)
    }
}

impl FromStr for BeaconData {
    type Err = ParseObservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; BEACON_DATA_SIZE];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

// Both newtypes travel as their canonical text form in JSON.
macro_rules! serde_via_display {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

serde_via_display!(MacAddress);
serde_via_display!(BeaconData);

/// One access point seen during a wifi scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiObservation {
    #[serde(rename = "macAddress")]
    pub mac: MacAddress,
    #[serde(rename = "signalStrength")]
    pub rssi: i8,
}

impl WifiObservation {
    pub fn new(mac: [u8; MAC_ADDRESS_SIZE], rssi: i8) -> Self {
        Self {
            mac: MacAddress(mac),
            rssi,
        }
    }
}

impl From<WifiRecordRaw> for WifiObservation {
    fn from(raw: WifiRecordRaw) -> Self {
        Self::new(raw.mac, raw.rssi)
    }
}

impl From<WifiObservation> for WifiRecordRaw {
    fn from(wifi: WifiObservation) -> Self {
        Self {
            mac: wifi.mac.0,
            rssi: wifi.rssi,
        }
    }
}

impl fmt::Display for WifiObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MAC: {}, RSSI: {} dBm", self.mac, self.rssi)
    }
}

/// One beacon advertisement seen during a BLE scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconObservation {
    pub data: BeaconData,
    #[serde(rename = "signalStrength")]
    pub rssi: i8,
}

impl BeaconObservation {
    pub fn new(data: [u8; BEACON_DATA_SIZE], rssi: i8) -> Self {
        Self {
            data: BeaconData(data),
            rssi,
        }
    }
}

impl From<BeaconRecordRaw> for BeaconObservation {
    fn from(raw: BeaconRecordRaw) -> Self {
        Self::new(raw.data, raw.rssi)
    }
}

impl From<BeaconObservation> for BeaconRecordRaw {
    fn from(beacon: BeaconObservation) -> Self {
        Self {
            data: beacon.data.0,
            rssi: beacon.rssi,
        }
    }
}

impl fmt::Display for BeaconObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload: {}, RSSI: {} dBm", self.data, self.rssi)
    }
}

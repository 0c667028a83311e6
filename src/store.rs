//! Persistence of accepted packets.
//!
//! Stores are append-only. Each frame gets a server-assigned id, and every
//! observation row carries that id plus the client id of the packet it came in.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use cwa_lib::{BeaconObservation, Frame, Packet, WifiObservation};
use rusqlite::{Connection, Transaction, params};
use tracing::{debug, info};

use crate::error::StoreError;

/// Server-assigned identifier of a stored frame.
pub type FrameId = i64;

/// What a store wrote for one packet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreReceipt {
    pub frame_ids: Vec<FrameId>,
    pub wifis: usize,
    pub beacons: usize,
}

/// Row counts of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub frames: usize,
    pub wifis: usize,
    pub beacons: usize,
}

/// Destination for decoded and verified packets.
pub trait FrameStore: Send + Sync {
    /// Persist every frame and observation of `packet`, all or nothing.
    fn store_packet(&self, packet: &Packet) -> Result<StoreReceipt, StoreError>;

    fn stats(&self) -> Result<StoreStats, StoreError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS frames (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id   INTEGER NOT NULL,
    timestamp   INTEGER NOT NULL,
    battery     INTEGER NOT NULL,
    hall        INTEGER NOT NULL,
    temperature INTEGER NOT NULL,
    received_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS wifis (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    frame_id    INTEGER NOT NULL REFERENCES frames(id),
    client_id   INTEGER NOT NULL,
    mac         TEXT NOT NULL,
    rssi        INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS beacons (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    frame_id    INTEGER NOT NULL REFERENCES frames(id),
    client_id   INTEGER NOT NULL,
    data        TEXT NOT NULL,
    rssi        INTEGER NOT NULL
);
";

/// SQLite-backed store. One transaction per packet.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!("Opening SQLite store at {:?}", path);
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Wifi observations of one stored frame, in transmission order
    pub fn wifis_for(&self, frame_id: FrameId) -> Result<Vec<(String, i8)>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt =
            conn.prepare("SELECT mac, rssi FROM wifis WHERE frame_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map([frame_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i8>(1)?))
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

fn insert_frame(
    tx: &Transaction<'_>,
    client_id: i16,
    frame: &Frame,
    received_at: &str,
) -> Result<FrameId, StoreError> {
    let header = &frame.header;
    tx.execute(
        "INSERT INTO frames (client_id, timestamp, battery, hall, temperature, received_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            client_id,
            header.timestamp,
            header.battery,
            header.hall,
            header.temperature,
            received_at
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn insert_wifi(
    tx: &Transaction<'_>,
    frame_id: FrameId,
    client_id: i16,
    wifi: &WifiObservation,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO wifis (frame_id, client_id, mac, rssi) VALUES (?1, ?2, ?3, ?4)",
        params![frame_id, client_id, wifi.mac.to_string(), wifi.rssi],
    )?;
    Ok(())
}

fn insert_beacon(
    tx: &Transaction<'_>,
    frame_id: FrameId,
    client_id: i16,
    beacon: &BeaconObservation,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO beacons (frame_id, client_id, data, rssi) VALUES (?1, ?2, ?3, ?4)",
        params![frame_id, client_id, beacon.data.to_string(), beacon.rssi],
    )?;
    Ok(())
}

impl FrameStore for SqliteStore {
    fn store_packet(&self, packet: &Packet) -> Result<StoreReceipt, StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let tx = conn.transaction()?;
        let client_id = packet.header.client_id;
        let received_at = Utc::now().to_rfc3339();
        let mut receipt = StoreReceipt::default();

        for frame in &packet.frames {
            let frame_id = insert_frame(&tx, client_id, frame, &received_at)?;
            for wifi in &frame.wifis {
                insert_wifi(&tx, frame_id, client_id, wifi)?;
            }
            for beacon in &frame.beacons {
                insert_beacon(&tx, frame_id, client_id, beacon)?;
            }
            receipt.frame_ids.push(frame_id);
            receipt.wifis += frame.wifis.len();
            receipt.beacons += frame.beacons.len();
        }

        tx.commit()?;
        debug!(client_id, frames = receipt.frame_ids.len(), "committed packet");
        Ok(receipt)
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let count = |table: &str| -> Result<usize, StoreError> {
            let n: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(n as usize)
        };
        Ok(StoreStats {
            frames: count("frames")?,
            wifis: count("wifis")?,
            beacons: count("beacons")?,
        })
    }
}

/// A frame held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFrame {
    pub id: FrameId,
    pub client_id: i16,
    pub frame: Frame,
}

/// In-process store used by `--dry-run` and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    frames: Mutex<Vec<StoredFrame>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Result<Vec<StoredFrame>, StoreError> {
        let frames = self.frames.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(frames.clone())
    }
}

impl FrameStore for MemoryStore {
    fn store_packet(&self, packet: &Packet) -> Result<StoreReceipt, StoreError> {
        let mut frames = self.frames.lock().map_err(|_| StoreError::Poisoned)?;
        let mut receipt = StoreReceipt::default();
        for frame in &packet.frames {
            let id = frames.len() as FrameId + 1;
            frames.push(StoredFrame {
                id,
                client_id: packet.header.client_id,
                frame: frame.clone(),
            });
            receipt.frame_ids.push(id);
            receipt.wifis += frame.wifis.len();
            receipt.beacons += frame.beacons.len();
        }
        Ok(receipt)
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let frames = self.frames.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(StoreStats {
            frames: frames.len(),
            wifis: frames.iter().map(|f| f.frame.wifis.len()).sum(),
            beacons: frames.iter().map(|f| f.frame.beacons.len()).sum(),
        })
    }
}

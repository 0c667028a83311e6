// src/error.rs

use cwa_lib::CwaError;
use thiserror::Error;

/// Failures of the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store lock poisoned by a panicked writer")]
    Poisoned,
}

/// Everything that can stop an upload from being accepted.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Rejected packet: {0}")]
    Rejected(#[from] CwaError),

    #[error("Storage failed: {0}")]
    Store(#[from] StoreError),

    #[error("Ingest task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

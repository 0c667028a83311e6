pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod server;
pub mod store;

pub use config::ServerConfig;
pub use error::{IngestError, StoreError};
pub use store::{FrameStore, MemoryStore, SqliteStore};

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use cwa_rs::logging::setup_logging;
use cwa_rs::server;
use cwa_rs::{FrameStore, MemoryStore, ServerConfig, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    let _guard = setup_logging(config.log_file.clone(), &config.verbose)?;

    let store: Arc<dyn FrameStore> = if config.dry_run {
        warn!("Dry run: accepted frames are kept in memory only");
        Arc::new(MemoryStore::new())
    } else {
        let store = SqliteStore::open(&config.database)
            .with_context(|| format!("Failed to open database {:?}", config.database))?;
        let stats = store.stats()?;
        info!(
            frames = stats.frames,
            wifis = stats.wifis,
            beacons = stats.beacons,
            "Store ready"
        );
        Arc::new(store)
    };

    server::run(config.bind, config.max_body_bytes, store).await
}

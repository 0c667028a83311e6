use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

/// Ingest server for CWA scanner uploads.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(short, long, env = "CWA_BIND", default_value = "0.0.0.0:1919")]
    pub bind: SocketAddr,
    /// Path of the SQLite database that receives accepted frames.
    #[arg(short, long, env = "CWA_DATABASE", default_value = "cwa.sqlite")]
    pub database: PathBuf,
    /// Largest request body accepted, in bytes.
    #[arg(long, env = "CWA_MAX_BODY_BYTES", default_value_t = 64 * 1024)]
    pub max_body_bytes: usize,
    /// Keep accepted frames in memory only.
    #[arg(long, env = "CWA_DRY_RUN")]
    pub dry_run: bool,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long, env = "CWA_LOG_FILE")]
    pub log_file: Option<PathBuf>,
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

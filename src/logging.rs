use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Console logging on stderr plus an optional log file.
///
/// INFO by default, DEBUG with -v, TRACE with -vv. `RUST_LOG` overrides per target.
/// Keep the returned guard alive or buffered file output is lost.
pub fn setup_logging(
    log_file_path: Option<PathBuf>,
    verbosity: &Verbosity<InfoLevel>,
) -> Result<Option<WorkerGuard>> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = if let Some(ref path) = log_file_path {
        let log_file = File::create(path)
            .with_context(|| format!("Failed to create log file at: {:?}", path))?;
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(log_file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(path) = log_file_path {
        info!("Logging to file: {:?}", path);
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test in this crate that installs the global subscriber.
    #[test]
    fn test_log_file_receives_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cwa.log");

        let guard = setup_logging(Some(path.clone()), &Verbosity::new(0, 0)).unwrap();
        assert!(guard.is_some());
        info!(client_id = 7, "packet accepted");
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Logging to file"));
        assert!(contents.contains("packet accepted"));
        assert!(contents.contains("client_id=7"));
        assert!(!contents.contains("\x1b["), "file output must not carry ANSI escapes");
    }

    #[test]
    fn test_missing_log_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("cwa.log");
        let err = setup_logging(Some(path), &Verbosity::new(0, 0)).unwrap_err();
        assert!(err.to_string().contains("Failed to create log file"));
    }
}

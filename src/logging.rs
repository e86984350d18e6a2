//! Tracing setup. The terminal belongs to the TUI, so events go to a log file
//! instead of stderr.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, Once};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "school_records_manager=info";

static INIT_ONCE: Once = Once::new();

/// Install the global subscriber writing to `log_file`. Later calls are
/// no-ops.
pub fn init(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;

    INIT_ONCE.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        // Another subscriber may already be installed by an embedding host.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent_and_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("logs").join("records.log");

        init(&log_file).unwrap();
        init(&log_file).unwrap();

        assert!(log_file.exists());
    }
}

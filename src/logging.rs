use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// `<dir>/run-<UTC timestamp>.log`
pub fn run_log_path(dir: &Path) -> PathBuf {
    dir.join(format!("run-{}.log", Utc::now().format("%Y%m%dT%H%M%SZ")))
}

/// Console output on stderr plus a plain-text copy in a fresh run log.
/// `RUST_LOG` overrides the default `info` level for both.
pub fn init(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }
    let file = File::create(log_file)
        .with_context(|| format!("Failed to create log file {:?}", log_file))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(())
}

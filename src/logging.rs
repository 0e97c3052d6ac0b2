use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILTER_ENV: &str = "WIDGET_SYNC_LOG";
const LOG_PATH_ENV: &str = "WIDGET_SYNC_LOG_PATH";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Installs the global `tracing` subscriber. Records go to the file named by
/// `WIDGET_SYNC_LOG_PATH` when set, stderr otherwise. Calling it again after a
/// subscriber is installed is a no-op.
pub fn init() -> Result<()> {
    let filter = resolve_filter();

    let installed = match resolve_log_path() {
        Some(path) => file_subscriber(&path, filter)?
            .try_init()
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) }),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

fn file_subscriber(
    path: &Path,
    filter: EnvFilter,
) -> Result<impl Subscriber + Send + Sync + 'static> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish())
}

fn resolve_filter() -> EnvFilter {
    let directives = std::env::var(LOG_FILTER_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    EnvFilter::try_new(&directives).unwrap_or_else(|err| {
        eprintln!("invalid {LOG_FILTER_ENV} '{directives}': {err}; using '{DEFAULT_LOG_FILTER}'");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    })
}

fn resolve_log_path() -> Option<PathBuf> {
    std::env::var(LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

//! Process-wide log setup.
//!
//! Logs go to stderr and, optionally, are appended to a file. The level is
//! taken from `RUST_LOG` when set, otherwise [`DEFAULT_FILTER`].

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::AugmentError;

pub const DEFAULT_FILTER: &str = "augsync=info";

/// Installs the global subscriber. Call once, before any work.
///
/// # Errors
/// [`AugmentError::Logging`] if the log file cannot be opened or a global
/// subscriber is already installed.
pub fn init_logging(log_file: Option<&Path>) -> Result<(), AugmentError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AugmentError::Logging {
                    message: format!("cannot open log file {}: {}", path.display(), e),
                })?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| AugmentError::Logging {
            message: e.to_string(),
        })
}

//! Log file setup
//!
//! The subscriber is built once from the `general` config section and handed
//! back as a [`Dispatch`]; callers run the batch inside
//! `tracing::dispatcher::with_default` instead of installing a global logger.
//! `CONTRACT_LEDGER_LOG` (same syntax as `RUST_LOG`) overrides the level.

use crate::config::{GeneralConfig, LogLevel};
use crate::error::LedgerResult;
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the configured log level
pub const LOG_ENV_VAR: &str = "CONTRACT_LEDGER_LOG";

/// Build a dispatcher appending timestamped, leveled lines to the log file
pub fn build_dispatch(general: &GeneralConfig) -> LedgerResult<Dispatch> {
    if let Some(parent) = general.log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&general.log_file)?;

    Ok(dispatch_with_writer(Mutex::new(file), general.log_level))
}

/// Build a dispatcher over any writer
pub fn dispatch_with_writer<W>(writer: W, level: LogLevel) -> Dispatch
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = EnvFilter::builder()
        .with_default_directive(level.as_level_filter().into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(filter)
        .finish();

    Dispatch::new(subscriber)
}

//! Process-wide tracing subscriber.
//!
//! `RUST_LOG` wins over the configured level. `log` records from the library
//! crates are bridged into tracing by `try_init`.

use remsync_core::sync::{SyncError, SyncResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_logging(level: &str, json: bool) -> SyncResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| {
            SyncError::invalid_config(format!("invalid log level '{}': {}", level, e))
        })?,
    };

    let (plain, structured) = if json {
        (None, Some(fmt::layer().json().with_target(true)))
    } else {
        (Some(fmt::layer().with_target(false)), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(structured)
        .try_init()
        .map_err(|e| SyncError::invalid_config(format!("logging already initialised: {}", e)))
}

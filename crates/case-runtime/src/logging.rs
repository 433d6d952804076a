//! Logging setup for hosts that do not install their own subscriber

use case_core::{CaseError, CaseResult};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Log output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set
    pub filter: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: "info".to_owned(),
            json: false,
        }
    }
}

/// Install the global `tracing` subscriber.
///
/// Fails with `CaseError::Logging` if the filter does not parse or a global
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> CaseResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| CaseError::Logging(format!("bad filter `{}`: {e}", config.filter)))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| CaseError::Logging(e.to_string()))
}

//! Log output for resolution runs
//!
//! Selector outcomes and stage transitions are logged at debug, so
//! `RUST_LOG=layer_core=debug` shows why a layer did or did not apply.

use crate::config::InheritanceSettings;
use crate::{Error, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directives used when neither `RUST_LOG` nor the settings name any
pub const DEFAULT_FILTER: &str = "info";

/// Log filter for a run
///
/// `RUST_LOG` wins, then `log_filter` from the settings, then
/// [`DEFAULT_FILTER`].
pub fn filter(settings: &InheritanceSettings) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    directives(settings.log_filter.as_deref().unwrap_or(DEFAULT_FILTER))
}

fn directives(text: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(text).map_err(|e| Error::InvalidSetting {
        key: "log_filter".to_string(),
        message: format!("'{text}': {e}"),
    })
}

/// Install a compact stdout subscriber filtered per [`filter`]
///
/// # Errors
///
/// Returns [`Error::InvalidSetting`] for unparsable directives and
/// [`Error::Logging`] when a global subscriber is already installed.
pub fn init(settings: &InheritanceSettings) -> Result<()> {
    let fmt_layer = fmt::layer().with_target(true).without_time().compact();

    tracing_subscriber::registry()
        .with(filter(settings)?)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

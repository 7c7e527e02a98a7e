//! Logging setup.
//!
//! The crate logs through `tracing`. Installing a subscriber is left to the
//! application unless it calls [`init`], which reads:
//!
//! - `RECORD_FILTER_DEBUG=true|1|yes` - enable debug logging
//! - `RECORD_FILTER_LOG_LEVEL=trace|debug|info|warn|error` - explicit level
//! - `RECORD_FILTER_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! ```rust,no_run
//! use record_filter_query::logging;
//!
//! // Call once at startup
//! logging::init();
//! ```

use std::sync::Once;

use crate::config::{EnvSource, StdEnvSource};

/// Enables debug logging.
pub const DEBUG_VAR: &str = "RECORD_FILTER_DEBUG";
/// Overrides the log level.
pub const LEVEL_VAR: &str = "RECORD_FILTER_LOG_LEVEL";
/// Selects the output format.
pub const FORMAT_VAR: &str = "RECORD_FILTER_LOG_FORMAT";

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line, human readable.
    Pretty,
    /// Single-line, human readable.
    Compact,
}

/// Logging settings resolved from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// Whether debug logging was requested.
    pub debug: bool,
    /// Whether a level was set explicitly.
    pub explicit_level: bool,
    /// Level directive for the crate targets.
    pub level: &'static str,
    /// Output format.
    pub format: LogFormat,
}

impl LogSettings {
    /// Resolve settings from an environment source.
    pub fn from_source(source: &impl EnvSource) -> Self {
        let debug = source
            .get(DEBUG_VAR)
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);
        let fallback = if debug { "debug" } else { "warn" };

        let requested = source.get(LEVEL_VAR);
        let level = match requested.as_deref().map(str::to_lowercase).as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => fallback,
        };

        let format = match source.get(FORMAT_VAR).map(|f| f.to_lowercase()).as_deref() {
            Some("pretty") => LogFormat::Pretty,
            Some("compact") => LogFormat::Compact,
            _ => LogFormat::Json,
        };

        Self {
            debug,
            explicit_level: requested.is_some(),
            level,
            format,
        }
    }

    /// Check if any logging was requested.
    pub fn is_requested(&self) -> bool {
        self.debug || self.explicit_level
    }
}

/// Check if debug logging is enabled via `RECORD_FILTER_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    LogSettings::from_source(&StdEnvSource).debug
}

/// Install a `tracing-subscriber` registry for the crate targets.
///
/// Does nothing unless logging was requested through the environment, or
/// when the `tracing-subscriber` feature is off. Subsequent calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        let settings = LogSettings::from_source(&StdEnvSource);
        if !settings.is_requested() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!(
                "record_filter={level},record_filter_query={level}",
                level = settings.level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let installed = match settings.format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = settings.level,
                    format = ?settings.format,
                    "record-filter logging initialized"
                );
            }
        }
    });
}

/// Debug-level event emitted only when `RECORD_FILTER_DEBUG` is enabled.
#[macro_export]
macro_rules! filter_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

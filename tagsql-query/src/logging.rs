//! Logging setup for tagsql.
//!
//! The crates log through `tracing`. Installing a subscriber is opt-in and
//! driven by environment variables:
//!
//! - `TAGSQL_DEBUG=true|1|yes` enables debug logging
//! - `TAGSQL_LOG_LEVEL=trace|debug|info|warn|error` sets the level
//! - `TAGSQL_LOG_FORMAT=json|pretty|compact` picks the output format (default: json)
//!
//! ```rust,no_run
//! use tagsql_query::logging;
//!
//! logging::init();
//! ```
//!
//! Composition logs each rendered statement at `debug` with its parameter
//! count and any tables it marked as changed. Parameter values are never logged.

use std::sync::Once;

use crate::config::{EnvSource, StdEnvSource};

static INIT: Once = Once::new();

/// Output format for the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

/// Logging settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Whether `TAGSQL_DEBUG` is on.
    pub debug: bool,
    /// Level used for the tagsql crates.
    pub level: &'static str,
    /// Output format.
    pub format: LogFormat,
    /// Whether anything asked for logging at all.
    pub requested: bool,
}

impl LogSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_source(&StdEnvSource)
    }

    /// Read settings from any [`EnvSource`].
    pub fn from_env_source<S: EnvSource + ?Sized>(source: &S) -> Self {
        let debug = source
            .get("TAGSQL_DEBUG")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);
        let explicit = source.get("TAGSQL_LOG_LEVEL");
        let fallback = if debug { "debug" } else { "warn" };

        let level = match explicit.as_deref().map(str::to_lowercase).as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => fallback,
        };

        let format = match source
            .get("TAGSQL_LOG_FORMAT")
            .map(|f| f.to_lowercase())
            .as_deref()
        {
            Some("pretty") => LogFormat::Pretty,
            Some("compact") => LogFormat::Compact,
            _ => LogFormat::Json,
        };

        Self {
            debug,
            level,
            format,
            requested: debug || explicit.is_some(),
        }
    }

    /// Filter directive covering every tagsql crate.
    pub fn directive(&self) -> String {
        format!(
            "tagsql={lvl},tagsql_query={lvl},tagsql_postgres={lvl}",
            lvl = self.level
        )
    }
}

/// Check if `TAGSQL_DEBUG` is enabled.
#[inline]
pub fn is_debug_enabled() -> bool {
    LogSettings::from_env().debug
}

/// The configured level, `debug` when `TAGSQL_DEBUG` is on and `warn` otherwise.
pub fn get_log_level() -> &'static str {
    LogSettings::from_env().level
}

/// The configured format.
pub fn get_log_format() -> LogFormat {
    LogSettings::from_env().format
}

/// Install the global subscriber.
///
/// Does nothing unless `TAGSQL_DEBUG` or `TAGSQL_LOG_LEVEL` is set, or when the
/// `tracing-subscriber` feature is off. Later calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        let settings = LogSettings::from_env();
        if !settings.requested {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter =
                EnvFilter::try_new(settings.directive()).unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);

            // A subscriber installed by the host application wins.
            let installed = match settings.format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = settings.level,
                    format = ?settings.format,
                    "tagsql logging initialized"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapEnvSource;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let settings = LogSettings::from_env_source(&MapEnvSource::new());
        assert!(!settings.debug);
        assert!(!settings.requested);
        assert_eq!(settings.level, "warn");
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn test_debug_flag_raises_level() {
        let env = MapEnvSource::new().set("TAGSQL_DEBUG", "YES");
        let settings = LogSettings::from_env_source(&env);
        assert!(settings.debug);
        assert!(settings.requested);
        assert_eq!(settings.level, "debug");
    }

    #[test]
    fn test_explicit_level_and_format() {
        let env = MapEnvSource::new()
            .set("TAGSQL_LOG_LEVEL", "Trace")
            .set("TAGSQL_LOG_FORMAT", "compact");
        let settings = LogSettings::from_env_source(&env);
        assert_eq!(settings.level, "trace");
        assert_eq!(settings.format, LogFormat::Compact);
        assert_eq!(
            settings.directive(),
            "tagsql=trace,tagsql_query=trace,tagsql_postgres=trace"
        );
    }

    #[test]
    fn test_unknown_level_falls_back() {
        let env = MapEnvSource::new().set("TAGSQL_LOG_LEVEL", "loud");
        let settings = LogSettings::from_env_source(&env);
        assert_eq!(settings.level, "warn");
        assert!(settings.requested);
    }
}

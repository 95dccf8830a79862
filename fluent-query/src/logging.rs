//! Logging setup.
//!
//! Events go through `tracing`. What gets installed is read from the
//! environment:
//!
//! - `FLUENT_DEBUG=true|1|yes` turns on debug events and statement tracing
//! - `FLUENT_LOG_LEVEL=trace|debug|info|warn|error` picks a level explicitly
//! - `FLUENT_LOG_FORMAT=json|pretty|compact` picks the output (default: json)
//!
//! ```rust,no_run
//! use fluent_query::logging;
//!
//! // Once, at startup.
//! logging::init();
//! ```

use std::env;
use std::fmt;
use std::sync::Once;

use tracing::Level;

const DEBUG_VAR: &str = "FLUENT_DEBUG";
const LEVEL_VAR: &str = "FLUENT_LOG_LEVEL";
const FORMAT_VAR: &str = "FLUENT_LOG_FORMAT";

/// Targets the filter directive covers.
const TARGETS: [&str; 3] = ["mongo_fluent", "fluent_query", "fluent_mongodb"];

static INIT: Once = Once::new();

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human output.
    Pretty,
    /// Single-line human output.
    Compact,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        })
    }
}

/// Logging switches, resolved once from their raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// `FLUENT_DEBUG` was set to a truthy value.
    pub debug: bool,
    /// `FLUENT_LOG_LEVEL` held a known level.
    pub explicit_level: Option<Level>,
    /// Output format.
    pub format: LogFormat,
}

impl LogSettings {
    /// Read the switches from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var(DEBUG_VAR).ok().as_deref(),
            env::var(LEVEL_VAR).ok().as_deref(),
            env::var(FORMAT_VAR).ok().as_deref(),
        )
    }

    /// Resolve the switches from raw variable values.
    pub fn from_vars(debug: Option<&str>, level: Option<&str>, format: Option<&str>) -> Self {
        Self {
            debug: debug.is_some_and(is_truthy),
            explicit_level: level.and_then(|raw| raw.trim().parse().ok()),
            format: format.map(LogFormat::parse).unwrap_or_default(),
        }
    }

    /// The effective level: explicit, else `debug` in debug mode, else `warn`.
    pub fn level(&self) -> Level {
        match self.explicit_level {
            Some(level) => level,
            None if self.debug => Level::DEBUG,
            None => Level::WARN,
        }
    }

    /// Whether anything asked for a subscriber.
    pub fn requested(&self) -> bool {
        self.debug || self.explicit_level.is_some()
    }

    /// The `EnvFilter` directive limiting output to this workspace's crates.
    pub fn filter_directive(&self) -> String {
        let level = self.level().to_string().to_ascii_lowercase();
        TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Check if debug mode is enabled via `FLUENT_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR).is_ok_and(|raw| is_truthy(&raw))
}

/// Initialize logging. Subsequent calls are no-ops.
///
/// Installs a subscriber only when the `tracing-subscriber` feature is on and
/// logging was requested through the environment.
pub fn init() {
    INIT.call_once(|| {
        let settings = LogSettings::from_env();
        if !settings.requested() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(settings.filter_directive())
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            match settings.format {
                LogFormat::Json => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json())
                        .init();
                }
                LogFormat::Compact => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().compact())
                        .init();
                }
                LogFormat::Pretty => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().pretty())
                        .init();
                }
            }

            tracing::info!(
                level = %settings.level(),
                format = %settings.format,
                "logging initialized"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_to_quiet_json() {
        let settings = LogSettings::from_vars(None, None, None);
        assert!(!settings.requested());
        assert_eq!(settings.level(), Level::WARN);
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn test_debug_switch_raises_level() {
        let settings = LogSettings::from_vars(Some("YES"), None, Some("compact"));
        assert!(settings.debug);
        assert!(settings.requested());
        assert_eq!(settings.level(), Level::DEBUG);
        assert_eq!(settings.format, LogFormat::Compact);

        assert!(!LogSettings::from_vars(Some("off"), None, None).debug);
    }

    #[test]
    fn test_explicit_level_wins() {
        let settings = LogSettings::from_vars(Some("1"), Some("error"), Some("pretty"));
        assert_eq!(settings.level(), Level::ERROR);
        assert_eq!(settings.format, LogFormat::Pretty);

        // Unknown levels fall back as if unset.
        let settings = LogSettings::from_vars(None, Some("loud"), Some("xml"));
        assert_eq!(settings.explicit_level, None);
        assert!(!settings.requested());
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn test_filter_directive() {
        let settings = LogSettings::from_vars(None, Some("info"), None);
        assert_eq!(
            settings.filter_directive(),
            "mongo_fluent=info,fluent_query=info,fluent_mongodb=info"
        );
    }
}

//! Logging utilities for steady-server
//!
//! This module is only available with the `logging` feature.
//!
//! Library users get tracing events only and install their own subscriber.
//! Binaries embedding the server can use these helpers.

use std::sync::Once;

use steady_config::GlobalSettings;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log level for server output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// No output at all
    Silent,
    /// Failed updates and watcher errors only
    Error,
    /// Also experimental-feature warnings from config resolution
    Warn,
    /// Server lifecycle and one line per HMR update (default)
    #[default]
    Info,
    /// Client connections, change batches and re-keyed groups
    Debug,
    /// Includes per-update perf points and ID assignment
    Trace,
}

impl LogLevel {
    fn as_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Silent => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    /// Level selected by the `[settings]` table. `trace = true` wins over
    /// `log_level`; an unknown level falls back to the default.
    pub fn from_settings(settings: &GlobalSettings) -> Self {
        if settings.trace {
            return LogLevel::Trace;
        }
        settings
            .log_level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or_default()
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("Invalid log level: {}", other)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_level_filter())
    }
}

/// Install a global subscriber at `level`. `RUST_LOG` directives still
/// apply on top. Only the first call in a process takes effect.
///
/// ```rust,no_run
/// use steady_server::logging::{init_logging, LogLevel};
///
/// init_logging(LogLevel::Info);
/// ```
pub fn init_logging(level: LogLevel) {
    INIT.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(level.as_level_filter().into())
            .from_env_lossy();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false).without_time())
            .init();
    });
}

/// Install a subscriber using the `[settings]` table of a loaded config.
pub fn init_logging_from_settings(settings: &GlobalSettings) {
    init_logging(LogLevel::from_settings(settings));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("off".parse::<LogLevel>().unwrap(), LogLevel::Silent);
        assert_eq!("TRACE".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Info.to_string(), "info");
        assert_eq!(LogLevel::Silent.to_string(), "off");
    }

    #[test]
    fn test_level_from_settings() {
        let mut settings = GlobalSettings::default();
        assert_eq!(LogLevel::from_settings(&settings), LogLevel::Info);

        settings.log_level = Some("debug".into());
        assert_eq!(LogLevel::from_settings(&settings), LogLevel::Debug);

        settings.log_level = Some("nonsense".into());
        assert_eq!(LogLevel::from_settings(&settings), LogLevel::Info);

        settings.trace = true;
        assert_eq!(LogLevel::from_settings(&settings), LogLevel::Trace);
    }
}

//! # Logging & Tracing Infrastructure
//!
//! Configures the `tracing-subscriber` stack for the player core:
//! - Pretty, JSON and compact output formats
//! - Module-level filtering via `EnvFilter`, with a default filter that
//!   keeps workspace crates at the configured level and dependencies at
//!   `warn`
//!
//! Call [`init_logging`] once during host application startup.

use crate::error::{Error, Result};
use std::io;
use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors, for development.
    Pretty,
    /// Structured JSON for machine parsing.
    Json,
    /// Compact single-line format for production consoles.
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Minimum level for workspace crates.
    pub level: Level,
    /// Custom filter string (e.g. `"core_player=trace"`); overrides the
    /// default workspace filter entirely when set.
    pub filter: Option<String>,
    /// Display the target module in log lines.
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: Level::INFO,
            filter: None,
            display_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }
}

/// Initialize the logging system.
///
/// Should be called once during application startup; subsequent calls
/// return an error because the global subscriber is already set.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    let registry = tracing_subscriber::registry().with(filter);
    let init_error = |e: tracing_subscriber::util::TryInitError| {
        Error::Config(format!("Failed to initialize logging: {}", e))
    };

    match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(config.display_target)
                    .with_writer(io::stdout),
            )
            .try_init()
            .map_err(init_error),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_target(config.display_target)
                    .with_writer(io::stdout),
            )
            .try_init()
            .map_err(init_error),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(config.display_target)
                    .with_writer(io::stdout),
            )
            .try_init()
            .map_err(init_error),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter_string = if let Some(custom) = &config.filter {
        custom.clone()
    } else {
        let level = config.level.as_str().to_lowercase();
        format!(
            "warn,core_runtime={level},core_player={level},bridge_traits={level},bridge_memory={level}",
        )
    };

    EnvFilter::try_new(filter_string)
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

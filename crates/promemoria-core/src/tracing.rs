//! Tracing setup for promemoria
//!
//! One entry point, [`init_tracing`], shared by the CLI and tests that want
//! log output. `RUST_LOG` always wins over the configured default level.
//!
//! ```ignore
//! use promemoria_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::operator())?;
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Crates whose events are enabled by the default filter.
const CRATE_TARGETS: [&str; 4] = [
    "promemoria",
    "promemoria_core",
    "promemoria_providers",
    "promemoria_client",
];

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Human-readable multi-line format
    Pretty,
    /// Compact single-line format (default)
    #[default]
    Compact,
    /// JSON lines, for log shipping
    Json,
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// The level applied to promemoria crates when RUST_LOG is not set
    pub default_level: Level,
    /// Output format for log messages
    pub output_format: TracingOutputFormat,
    /// Whether to include file/line information in logs
    pub include_location: bool,
    /// Whether to include target (module path) in logs
    pub include_target: bool,
    /// Whether to include timestamps
    pub include_timestamp: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: false,
            include_timestamp: true,
        }
    }
}

impl TracingConfig {
    /// Quiet config for an operator at a terminal: warnings only, no timestamps.
    #[must_use]
    pub fn operator() -> Self {
        Self {
            default_level: Level::WARN,
            include_timestamp: false,
            ..Self::default()
        }
    }

    /// Verbose config for `--debug`.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_location: true,
            include_target: true,
            include_timestamp: false,
            ..Self::default()
        }
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// The directive used when RUST_LOG is not set.
    pub fn default_directive(&self) -> String {
        let level = self.default_level.to_string().to_lowercase();
        CRATE_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Initialize tracing with the given configuration.
///
/// Call once, early in `main`.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set or if
/// the env filter directive is invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.default_directive())?,
    };

    match config.output_format {
        TracingOutputFormat::Pretty => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_target(config.include_target),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
        TracingOutputFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_target(config.include_target);

            let layer = if config.include_timestamp {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            };

            let subscriber = tracing_subscriber::registry().with(env_filter).with(layer);
            tracing::subscriber::set_global_default(subscriber)?;
        }
        TracingOutputFormat::Json => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_target(config.include_target),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

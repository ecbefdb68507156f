//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use promemoria_core::TracingOutputFormat;
use promemoria_providers::ProviderResult;
use promemoria_providers::google::AuthorizationCallback;

/// promemoria - WhatsApp reminders for tomorrow's appointments
#[derive(Debug, Parser)]
#[command(name = "promemoria")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "PROMEMORIA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, env = "PROMEMORIA_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Multi-line, human oriented
    Pretty,
    /// One line per event
    Compact,
    /// JSON lines
    Json,
}

impl From<LogFormat> for TracingOutputFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
            LogFormat::Json => Self::Json,
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Obtain or refresh Google access
    Auth {
        #[command(flatten)]
        callback: CallbackArgs,

        /// Open the consent page in the default browser
        #[arg(long)]
        open: bool,
    },

    /// Show tomorrow's appointments
    Find {
        #[command(flatten)]
        callback: CallbackArgs,

        /// Print appointments and failures as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send WhatsApp reminders for tomorrow's appointments
    Send {
        #[command(flatten)]
        callback: CallbackArgs,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Result of the consent redirect, passed on the run after the URL was shown.
#[derive(Debug, Clone, Default, Args)]
pub struct CallbackArgs {
    /// Full URL Google redirected to after consent
    #[arg(long, conflicts_with_all = ["code", "error", "state"])]
    pub callback_url: Option<String>,

    /// Authorization code from the redirect
    #[arg(long, conflicts_with = "error")]
    pub code: Option<String>,

    /// Error reported by the redirect (e.g. access_denied)
    #[arg(long)]
    pub error: Option<String>,

    /// State parameter from the redirect
    #[arg(long)]
    pub state: Option<String>,
}

impl CallbackArgs {
    /// Builds the callback, if any was given.
    pub fn to_callback(&self) -> ProviderResult<Option<AuthorizationCallback>> {
        if let Some(ref url) = self.callback_url {
            return AuthorizationCallback::from_callback_url(url).map(Some);
        }
        if let Some(ref error) = self.error {
            return Ok(Some(AuthorizationCallback::Denied {
                error: error.clone(),
                state: self.state.clone(),
            }));
        }
        Ok(self.code.as_ref().map(|code| AuthorizationCallback::Code {
            code: code.clone(),
            state: self.state.clone(),
        }))
    }
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

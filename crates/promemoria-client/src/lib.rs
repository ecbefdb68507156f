//! CLI, configuration, appointment resolution and reminder dispatch
//!
//! This crate provides the `promemoria` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod render;
pub mod resolve;
pub mod secret;
pub mod session;

pub use cli::Cli;
pub use dispatch::{DispatchReport, ReminderDispatcher};
pub use error::{ClientError, ClientResult};
pub use resolve::AppointmentResolver;

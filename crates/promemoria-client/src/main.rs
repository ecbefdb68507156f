//! promemoria CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use promemoria_client::cli::{Cli, Command, ConfigAction};
use promemoria_client::commands;
use promemoria_client::config::ClientConfig;
use promemoria_client::error::{ClientError, ClientResult};
use promemoria_core::{TracingConfig, init_tracing};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing = if cli.debug {
        TracingConfig::debug()
    } else {
        TracingConfig::operator()
    }
    .with_format(cli.log_format.into());
    if let Err(e) = init_tracing(tracing) {
        eprintln!("warning: logging disabled: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ClientError::AuthorizationPending { url }) => {
            println!("Autorizzazione necessaria. Apri questo indirizzo nel browser:");
            println!();
            println!("{}", url);
            println!();
            println!("Poi ripeti il comando con --callback-url '<indirizzo di ritorno>'.");
            ExitCode::SUCCESS
        }
        Err(ClientError::AuthorizationDeclined(reason)) => {
            eprintln!("attenzione: autorizzazione negata ({})", reason);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    }
    .map_err(ClientError::Config)?;

    match cli.command {
        Command::Auth { callback, open } => commands::auth::run(&config, &callback, open).await,
        Command::Find { callback, json } => commands::find::run(&config, &callback, json).await,
        Command::Send { callback, yes } => commands::send::run(&config, &callback, yes).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}

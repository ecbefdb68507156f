//! Subcommand implementations.

pub mod auth;
pub mod config;
pub mod find;
pub mod send;

use promemoria_providers::google::{
    AuthorizationCoordinator, Credential, CredentialOutcome, GoogleConfig,
};

use crate::cli::CallbackArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionFile;

/// Runs the authorization coordinator with the persisted session.
///
/// Configuration problems surface before any file or network access.
pub(crate) async fn authorize(
    config: &ClientConfig,
    callback: &CallbackArgs,
) -> ClientResult<(GoogleConfig, CredentialOutcome)> {
    let google = config
        .google()
        .and_then(|g| g.to_provider_config())
        .map_err(ClientError::Config)?;
    let coordinator = AuthorizationCoordinator::new(google.clone())?;
    let callback = callback.to_callback()?;

    let session_file = SessionFile::new(config.deployment.session_path());
    let mut session = session_file.load();
    let outcome = coordinator.obtain_credential(&mut session, callback).await;
    session_file.save(&session)?;

    Ok((google, outcome?))
}

/// Like [`authorize`], but anything short of a credential ends the run.
pub(crate) async fn require_credential(
    config: &ClientConfig,
    callback: &CallbackArgs,
) -> ClientResult<(GoogleConfig, Credential)> {
    match authorize(config, callback).await? {
        (google, CredentialOutcome::Ready(credential)) => Ok((google, credential)),
        (_, CredentialOutcome::Pending(request)) => {
            Err(ClientError::AuthorizationPending { url: request.url })
        }
        (_, CredentialOutcome::Declined { reason }) => {
            Err(ClientError::AuthorizationDeclined(reason))
        }
    }
}

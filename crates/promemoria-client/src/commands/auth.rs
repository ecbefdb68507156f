//! `promemoria auth`: run the authorization step on its own.

use tracing::{info, warn};

use promemoria_providers::google::CredentialOutcome;

use crate::cli::CallbackArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Obtains a credential, or prints the consent URL to visit.
///
/// With `open_browser`, the consent page is also opened in the default browser.
/// After consent, rerun with `--callback-url '<redirected URL>'`.
pub async fn run(config: &ClientConfig, callback: &CallbackArgs, open_browser: bool) -> ClientResult<()> {
    let (_, outcome) = super::authorize(config, callback).await?;

    match outcome {
        CredentialOutcome::Ready(credential) => {
            info!("google authorization ready");
            println!("Accesso a Google attivo.");
            if let Some(expiry) = credential.expiry {
                println!("Token valido fino a {} UTC.", expiry.format("%Y-%m-%d %H:%M"));
            }
            Ok(())
        }
        CredentialOutcome::Pending(request) => {
            println!("Autorizzazione necessaria. Apri questo indirizzo nel browser:");
            println!();
            println!("{}", request.url);
            println!();
            println!("Poi esegui: promemoria auth --callback-url '<indirizzo di ritorno>'");

            if open_browser && let Err(e) = open::that(&request.url) {
                warn!("failed to open browser: {}", e);
            }
            Ok(())
        }
        CredentialOutcome::Declined { reason } => Err(ClientError::AuthorizationDeclined(reason)),
    }
}

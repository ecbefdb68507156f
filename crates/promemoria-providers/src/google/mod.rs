//! Google provider: OAuth, Calendar and People.
//!
//! # Authorization flow
//!
//! 1. The operator supplies an OAuth client ID/secret and a redirect URL
//!    registered in the Cloud Console
//! 2. [`AuthorizationCoordinator`] returns a consent URL with a PKCE challenge
//!    and records the verifier in the [`AuthSession`]
//! 3. The operator grants access; Google redirects to the callback URL
//! 4. The redirected URL (or its code) is passed back on the next run and
//!    exchanged for a credential
//! 5. The credential is persisted and refreshed on later runs
//!
//! # Example
//!
//! ```ignore
//! use promemoria_providers::google::{
//!     AuthSession, AuthorizationCoordinator, CredentialOutcome, GoogleCalendarClient,
//!     GoogleConfig, OAuthCredentials,
//! };
//!
//! let config = GoogleConfig::new(OAuthCredentials::from_file("credentials_web.json")?)
//!     .with_redirect_url("https://studio.example.com/oauth2callback");
//! let coordinator = AuthorizationCoordinator::new(config.clone())?;
//!
//! let mut session = AuthSession::new();
//! match coordinator.obtain_credential(&mut session, None).await? {
//!     CredentialOutcome::Ready(credential) => {
//!         let calendar =
//!             GoogleCalendarClient::new(&credential, &config.calendar_api_base, config.timeout)?;
//!     }
//!     CredentialOutcome::Pending(request) => println!("visit {}", request.url),
//!     CredentialOutcome::Declined { reason } => eprintln!("declined: {}", reason),
//! }
//! ```

mod calendar;
mod config;
mod coordinator;
mod credential;
mod http;
mod oauth;
mod people;
mod store;

pub use calendar::GoogleCalendarClient;
pub use config::{
    CALENDAR_READONLY_SCOPE, CONTACTS_READONLY_SCOPE, GoogleConfig, OAuthCredentials,
    REDIRECT_PATH,
};
pub use coordinator::{
    AuthSession, AuthorizationCallback, AuthorizationCoordinator, AuthorizationRequest,
    CredentialOutcome, PendingAuthorization,
};
pub use credential::{Credential, EXPIRY_SKEW_SECS, StoredTimestamp};
pub use oauth::{OAuthClient, PkceFlow};
pub use people::GooglePeopleClient;
pub use store::{CredentialStore, StoreError};

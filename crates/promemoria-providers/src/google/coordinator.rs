//! Authorization state machine.
//!
//! [`AuthorizationCoordinator::obtain_credential`] walks the states in order:
//! in-memory cache, refresh of the cached credential, durable store (with
//! its own refresh), and finally the interactive grant. The grant is split
//! across two invocations: the first returns [`CredentialOutcome::Pending`]
//! with a consent URL and records the PKCE verifier in the [`AuthSession`];
//! a later invocation passes the redirect result back as an
//! [`AuthorizationCallback`].
//!
//! Corrupt or unrefreshable credentials are recovered from locally by
//! discarding them. Only configuration, storage I/O and code-exchange
//! failures reach the caller as errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

use super::config::GoogleConfig;
use super::credential::Credential;
use super::oauth::{OAuthClient, PkceFlow};
use super::store::{CredentialStore, StoreError};

/// An interactive grant that has been started but not completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    /// Opaque token echoed back by the consent redirect.
    pub state: String,
    /// PKCE verifier to present with the returned code.
    pub verifier: String,
    /// When the consent URL was issued.
    pub created_at: DateTime<Utc>,
}

/// State carried between pipeline runs.
///
/// The pending authorization is meant to be persisted by the caller between
/// invocations. The cached credential only lives for one process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(skip)]
    cached: Option<Credential>,
    #[serde(default)]
    pending: Option<PendingAuthorization>,
}

impl AuthSession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the in-memory credential, if any.
    pub fn cached(&self) -> Option<&Credential> {
        self.cached.as_ref()
    }

    /// Returns the pending authorization, if any.
    pub fn pending(&self) -> Option<&PendingAuthorization> {
        self.pending.as_ref()
    }

    /// Drops the pending authorization.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Seeds the in-memory cache.
    pub fn with_cached(mut self, credential: Credential) -> Self {
        self.cached = Some(credential);
        self
    }
}

/// Result of the consent redirect, supplied on the invocation after
/// [`CredentialOutcome::Pending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationCallback {
    /// The user granted access.
    Code {
        code: String,
        state: Option<String>,
    },
    /// The user refused, or Google reported an error.
    Denied {
        error: String,
        state: Option<String>,
    },
}

impl AuthorizationCallback {
    /// Parses the full redirected URL (`...?code=..&state=..` or `...?error=..`).
    pub fn from_callback_url(raw: &str) -> ProviderResult<Self> {
        let url = Url::parse(raw.trim()).map_err(|e| {
            ProviderError::bad_request(format!("invalid callback URL {:?}: {}", raw, e))
        })?;

        let mut code = None;
        let mut state = None;
        let mut error = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                _ => {}
            }
        }

        match (error, code) {
            (Some(error), _) => Ok(Self::Denied { error, state }),
            (None, Some(code)) if !code.is_empty() => Ok(Self::Code { code, state }),
            _ => Err(ProviderError::bad_request(
                "callback URL carries neither a code nor an error",
            )),
        }
    }
}

/// Descriptor of the consent page the operator must visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Consent URL.
    pub url: String,
    /// State token embedded in the URL.
    pub state: String,
}

/// What [`AuthorizationCoordinator::obtain_credential`] produced.
#[derive(Debug, Clone)]
pub enum CredentialOutcome {
    /// A valid credential; the pipeline may proceed.
    Ready(Credential),
    /// Consent is required; the pipeline must stop until the callback arrives.
    Pending(AuthorizationRequest),
    /// The operator refused consent.
    Declined { reason: String },
}

impl CredentialOutcome {
    /// Returns the credential if the outcome is [`CredentialOutcome::Ready`].
    pub fn into_credential(self) -> Option<Credential> {
        match self {
            Self::Ready(credential) => Some(credential),
            _ => None,
        }
    }
}

/// Produces a valid credential or a consent request.
#[derive(Debug)]
pub struct AuthorizationCoordinator {
    config: GoogleConfig,
    store: CredentialStore,
    oauth: OAuthClient,
}

impl AuthorizationCoordinator {
    /// Creates a coordinator. Fails if the configuration is incomplete.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate()?;
        let store = CredentialStore::new(config.token_path.clone());
        let oauth = OAuthClient::from_config(&config)?;
        Ok(Self {
            config,
            store,
            oauth,
        })
    }

    /// Returns the credential store.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Runs the authorization state machine.
    pub async fn obtain_credential(
        &self,
        session: &mut AuthSession,
        callback: Option<AuthorizationCallback>,
    ) -> ProviderResult<CredentialOutcome> {
        if let Some(credential) = self.from_cache(session).await {
            return Ok(CredentialOutcome::Ready(credential));
        }

        if let Some(credential) = self.from_store(session).await? {
            return Ok(CredentialOutcome::Ready(credential));
        }

        self.interactive(session, callback).await
    }

    async fn from_cache(&self, session: &mut AuthSession) -> Option<Credential> {
        let mut credential = session.cached.take()?;

        if credential.is_valid() {
            debug!("using cached credential");
            session.cached = Some(credential.clone());
            return Some(credential);
        }

        if !credential.can_refresh() {
            debug!("cached credential expired without refresh token, discarding");
            return None;
        }

        match self.oauth.refresh(&mut credential).await {
            Ok(()) => {
                self.persist(&credential);
                session.cached = Some(credential.clone());
                Some(credential)
            }
            Err(e) => {
                warn!("refresh of cached credential failed, discarding: {}", e);
                self.discard_stored();
                None
            }
        }
    }

    async fn from_store(&self, session: &mut AuthSession) -> ProviderResult<Option<Credential>> {
        let mut credential = match self.store.load() {
            Ok(Some(credential)) => credential,
            Ok(None) => return Ok(None),
            Err(StoreError::Corrupt { path, reason }) => {
                warn!("stored credential {:?} is corrupt ({}), deleting", path, reason);
                self.discard_stored();
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if !credential.has_scopes(&self.config.scopes) {
            info!("stored credential lacks required scopes, new consent needed");
            return Ok(None);
        }

        if credential.is_valid() {
            debug!("using stored credential");
            session.cached = Some(credential.clone());
            return Ok(Some(credential));
        }

        if !credential.can_refresh() {
            info!("stored credential expired without refresh token");
            return Ok(None);
        }

        match self.oauth.refresh(&mut credential).await {
            Ok(()) => {
                self.persist(&credential);
                session.cached = Some(credential.clone());
                Ok(Some(credential))
            }
            Err(e) => {
                warn!("refresh of stored credential failed, discarding: {}", e);
                self.discard_stored();
                Ok(None)
            }
        }
    }

    async fn interactive(
        &self,
        session: &mut AuthSession,
        callback: Option<AuthorizationCallback>,
    ) -> ProviderResult<CredentialOutcome> {
        match callback {
            Some(AuthorizationCallback::Denied { error, .. }) => {
                warn!("authorization declined: {}", error);
                session.clear_pending();
                return Ok(CredentialOutcome::Declined { reason: error });
            }
            Some(AuthorizationCallback::Code { code, state }) => match session.pending.take() {
                Some(pending) => {
                    if let Some(state) = state
                        && state != pending.state
                    {
                        session.pending = Some(pending);
                        return Err(ProviderError::authentication(
                            "authorization state mismatch; the callback belongs to another request",
                        ));
                    }

                    let credential = self
                        .oauth
                        .exchange_code(
                            &code,
                            &pending.verifier,
                            self.config.redirect_url()?,
                            &self.config.scopes,
                        )
                        .await?;
                    self.persist(&credential);
                    session.cached = Some(credential.clone());
                    return Ok(CredentialOutcome::Ready(credential));
                }
                None => {
                    warn!("received an authorization code with no pending request, starting over");
                }
            },
            None => {}
        }

        let flow = PkceFlow::new();
        let url = flow.authorization_url(
            &self.config.auth_url,
            &self.config.credentials.client_id,
            self.config.redirect_url()?,
            &self.config.scopes,
        );
        session.pending = Some(PendingAuthorization {
            state: flow.state.clone(),
            verifier: flow.verifier,
            created_at: Utc::now(),
        });

        info!("authorization required");
        Ok(CredentialOutcome::Pending(AuthorizationRequest {
            url,
            state: flow.state,
        }))
    }

    fn persist(&self, credential: &Credential) {
        if let Err(e) = self.store.save(credential) {
            warn!("failed to persist credential: {}", e);
        }
    }

    fn discard_stored(&self) {
        if let Err(e) = self.store.remove() {
            warn!("failed to remove stored credential: {}", e);
        }
    }
}

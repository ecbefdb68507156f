//! OAuth 2.0 authorization code flow with PKCE for Google APIs.
//!
//! Unlike a desktop loopback flow, the redirect lands on a deployed
//! callback URL, so the flow is split in two: [`PkceFlow`] produces the
//! consent URL, and a later invocation hands the returned code to
//! [`OAuthClient::exchange_code`] together with the saved verifier.

use std::collections::BTreeSet;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{NaiveDateTime, Utc};
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

use super::config::{GoogleConfig, OAuthCredentials};
use super::credential::Credential;

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// Token endpoint client: code exchange and refresh.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    token_url: String,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    pub fn new(
        credentials: OAuthCredentials,
        token_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> ProviderResult<Self> {
        let http_client = crate::http::build_client(timeout)?;

        Ok(Self {
            credentials,
            token_url: token_url.into(),
            http_client,
        })
    }

    /// Creates a client from a [`GoogleConfig`].
    pub fn from_config(config: &GoogleConfig) -> ProviderResult<Self> {
        Self::new(
            config.credentials.clone(),
            config.token_url.clone(),
            config.timeout,
        )
    }

    /// Refreshes `credential` in place.
    ///
    /// The request goes to the credential's own `token_uri` with the client
    /// identity recorded in it. Any non-success status is an authentication
    /// failure: the refresh token is revoked, expired, or otherwise unusable.
    pub async fn refresh(&self, credential: &mut Credential) -> ProviderResult<()> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::authentication("credential has no refresh token"))?;

        let params = [
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        debug!("refreshing access token at {}", credential.token_endpoint);
        let response = self
            .post_form(&credential.token_endpoint, &params, "token refresh")
            .await?;

        credential.apply_refresh(
            response.access_token,
            response.expires_in,
            response.refresh_token,
            now_naive_utc(),
        );
        info!("refreshed access token");
        Ok(())
    }

    /// Exchanges an authorization code for a new credential.
    ///
    /// Granted scopes come from the response when present, otherwise the
    /// requested scopes are assumed.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
        requested_scopes: &[String],
    ) -> ProviderResult<Credential> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .post_form(&self.token_url, &params, "token exchange")
            .await?;

        let scopes: BTreeSet<String> = match response.scope.as_deref() {
            Some(granted) => granted.split_whitespace().map(String::from).collect(),
            None => requested_scopes.iter().cloned().collect(),
        };

        info!("obtained credential from authorization code");
        Ok(Credential {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_endpoint: self.token_url.clone(),
            client_id: self.credentials.client_id.clone(),
            client_secret: self.credentials.client_secret.clone(),
            scopes,
            expiry: Credential::expiry_after(now_naive_utc(), response.expires_in),
        })
    }

    async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenResponse> {
        let response = self
            .http_client
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "{} failed ({}): {}",
                what, status, body
            ))
            .with_provider("google"));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid token response: {}", e))
        })
    }
}

fn now_naive_utc() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// PKCE flow state and utilities.
///
/// Implements RFC 7636 (Proof Key for Code Exchange).
#[derive(Debug, Clone)]
pub struct PkceFlow {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 hash of verifier, base64url encoded).
    pub challenge: String,
    /// Random state correlating the consent redirect with this flow.
    pub state: String,
}

impl PkceFlow {
    /// Creates a new PKCE flow with random verifier and state.
    pub fn new() -> Self {
        let verifier = Self::generate_verifier();
        let challenge = Self::compute_challenge(&verifier);
        let state = Self::generate_state();

        Self {
            verifier,
            challenge,
            state,
        }
    }

    fn generate_verifier() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..CODE_VERIFIER_LENGTH).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }

    fn generate_state() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..16).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    /// Builds the consent URL.
    ///
    /// Requests offline access with forced consent so a refresh token is
    /// always issued, and asks Google to merge previously granted scopes.
    pub fn authorization_url(
        &self,
        auth_url: &str,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> String {
        let scope = scopes.join(" ");

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&include_granted_scopes=true&prompt=consent",
            auth_url,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OAuthClient {
        OAuthClient::new(
            OAuthCredentials::new("id.apps.googleusercontent.com", "secret"),
            format!("{}/token", server.uri()),
            Some(Duration::from_secs(5)),
        )
        .unwrap()
    }

    fn expired_credential(token_endpoint: String) -> Credential {
        Credential {
            access_token: "old".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            token_endpoint,
            client_id: "id.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            scopes: BTreeSet::new(),
            expiry: Some(now_naive_utc() - chrono::Duration::hours(1)),
        }
    }

    #[test]
    fn pkce_verifier_length() {
        // 32 bytes, base64url without padding
        assert_eq!(PkceFlow::new().verifier.len(), 43);
    }

    #[test]
    fn pkce_challenge_matches_rfc_example() {
        // RFC 7636, appendix B
        assert_eq!(
            PkceFlow::compute_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn pkce_state_is_random() {
        assert_ne!(PkceFlow::new().state, PkceFlow::new().state);
    }

    #[test]
    fn authorization_url_requests_offline_access() {
        let flow = PkceFlow::new();
        let url = flow.authorization_url(
            GoogleConfig::DEFAULT_AUTH_URL,
            "test-client.apps.googleusercontent.com",
            "https://studio.example.com/oauth2callback",
            &[
                "https://www.googleapis.com/auth/calendar.readonly".to_string(),
                "https://www.googleapis.com/auth/contacts.readonly".to_string(),
            ],
        );

        assert!(url.starts_with(GoogleConfig::DEFAULT_AUTH_URL));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fstudio.example.com%2Foauth2callback"));
        assert!(url.contains("calendar.readonly%20https"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("state={}", flow.state)));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("include_granted_scopes=true"));
        assert!(url.contains("prompt=consent"));
    }

    #[tokio::test]
    async fn exchange_code_builds_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code_verifier=verifier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.fresh",
                "refresh_token": "1//new",
                "expires_in": 3599,
                "scope": "b a",
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cred = client(&server)
            .exchange_code("4/code", "verifier", "https://x/oauth2callback", &[])
            .await
            .unwrap();

        assert_eq!(cred.access_token, "ya29.fresh");
        assert_eq!(cred.refresh_token.as_deref(), Some("1//new"));
        assert_eq!(cred.token_endpoint, format!("{}/token", server.uri()));
        assert_eq!(cred.scopes, BTreeSet::from(["a".to_string(), "b".to_string()]));
        assert!(cred.is_valid());
    }

    #[tokio::test]
    async fn refresh_updates_in_place() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.refreshed",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut cred = expired_credential(format!("{}/token", server.uri()));
        client(&server).refresh(&mut cred).await.unwrap();

        assert_eq!(cred.access_token, "ya29.refreshed");
        assert_eq!(cred.refresh_token.as_deref(), Some("1//refresh"));
        assert!(cred.is_valid());
    }

    #[tokio::test]
    async fn refresh_rejected_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#),
            )
            .mount(&server)
            .await;

        let mut cred = expired_credential(format!("{}/token", server.uri()));
        let err = client(&server).refresh(&mut cred).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(err.message().contains("invalid_grant"));
        assert_eq!(cred.access_token, "old");
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_fails_fast() {
        let server = MockServer::start().await;
        let mut cred = expired_credential(format!("{}/token", server.uri()));
        cred.refresh_token = None;

        let err = client(&server).refresh(&mut cred).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    }
}

//! Google provider configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Read-only access to the user's calendars.
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Read-only access to the user's contacts.
pub const CONTACTS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/contacts.readonly";

/// Path appended to `base_url` when no explicit redirect URL is configured.
pub const REDIRECT_PATH: &str = "/oauth2callback";

/// OAuth 2.0 client credentials for Google API access.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from Google Cloud Console.
    pub client_secret: String,
}

/// Structure of Google's OAuth client secrets JSON file.
///
/// Supports the Cloud Console download (`web` or `installed` section) and a
/// flat layout with `client_id` / `client_secret` at the root.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    web: Option<NestedCredentials>,
    installed: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads OAuth credentials from a client secrets JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("failed to read client secrets file: {}", e))?;
        Self::from_json(&content)
    }

    /// Parses OAuth credentials from a client secrets JSON string.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: ClientSecretsFile = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse client secrets JSON: {}", e))?;

        if let Some(creds) = file.web.or(file.installed) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::new(client_id, client_secret));
        }

        Err("client secrets must contain a 'web'/'installed' section or 'client_id'/'client_secret' at root level".to_string())
    }

    /// Validates that the credentials appear to be correctly formatted.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Configuration for the Google side of the pipeline.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client credentials.
    pub credentials: OAuthCredentials,

    /// Calendar whose events are appointments. Defaults to `"primary"`.
    pub calendar_id: String,

    /// Where Google redirects after consent. Required before any grant.
    pub redirect_url: Option<String>,

    /// Path of the persisted credential.
    ///
    /// Defaults to `~/.local/share/promemoria/token.json`.
    pub token_path: PathBuf,

    /// Scopes requested on every interactive grant.
    pub scopes: Vec<String>,

    /// Request timeout for all Google HTTP calls. `None` leaves reqwest's default.
    pub timeout: Option<Duration>,

    /// Consent page endpoint.
    pub auth_url: String,

    /// Token endpoint for code exchange. Refresh uses the credential's own `token_uri`.
    pub token_url: String,

    /// Calendar API v3 base URL.
    pub calendar_api_base: String,

    /// People API v1 base URL.
    pub people_api_base: String,
}

impl GoogleConfig {
    /// Google's consent page.
    pub const DEFAULT_AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";

    /// Google's token endpoint.
    pub const DEFAULT_TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Calendar API v3.
    pub const DEFAULT_CALENDAR_API: &'static str = "https://www.googleapis.com/calendar/v3";

    /// People API v1.
    pub const DEFAULT_PEOPLE_API: &'static str = "https://people.googleapis.com/v1";

    /// Creates a configuration with Google's endpoints and the two read-only scopes.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            calendar_id: "primary".to_string(),
            redirect_url: None,
            token_path: Self::default_token_path(),
            scopes: vec![
                CALENDAR_READONLY_SCOPE.to_string(),
                CONTACTS_READONLY_SCOPE.to_string(),
            ],
            timeout: None,
            auth_url: Self::DEFAULT_AUTH_URL.to_string(),
            token_url: Self::DEFAULT_TOKEN_URL.to_string(),
            calendar_api_base: Self::DEFAULT_CALENDAR_API.to_string(),
            people_api_base: Self::DEFAULT_PEOPLE_API.to_string(),
        }
    }

    /// Returns the default credential path.
    pub fn default_token_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("promemoria")
            .join("token.json")
    }

    /// Builds a redirect URL from a deployment base URL.
    pub fn redirect_from_base(base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), REDIRECT_PATH)
    }

    /// Sets the calendar ID.
    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    /// Sets the redirect URL.
    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// Sets the credential storage path.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Points every endpoint at one base URL. Used against mock servers.
    pub fn with_endpoint_base(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.auth_url = format!("{base}/o/oauth2/v2/auth");
        self.token_url = format!("{base}/token");
        self.calendar_api_base = format!("{base}/calendar/v3");
        self.people_api_base = format!("{base}/people/v1");
        self
    }

    /// Returns the validated redirect URL.
    pub fn redirect_url(&self) -> ProviderResult<&str> {
        let url = self.redirect_url.as_deref().ok_or_else(|| {
            ProviderError::configuration(
                "redirect URL not configured; set google.redirect_url or google.base_url",
            )
        })?;
        Url::parse(url).map_err(|e| {
            ProviderError::configuration(format!("invalid redirect URL {:?}: {}", url, e))
        })?;
        Ok(url)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ProviderResult<()> {
        self.credentials.validate().map_err(|e| {
            ProviderError::configuration(format!("invalid credentials: {}", e))
        })?;

        self.redirect_url()?;

        if self.scopes.is_empty() {
            return Err(ProviderError::configuration(
                "at least one OAuth scope is required",
            ));
        }

        if self.calendar_id.trim().is_empty() {
            return Err(ProviderError::configuration("calendar_id must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    fn test_credentials() -> OAuthCredentials {
        OAuthCredentials::new("test-client.apps.googleusercontent.com", "test-secret")
    }

    #[test]
    fn credentials_validation() {
        assert!(test_credentials().validate().is_ok());
        assert!(OAuthCredentials::new("", "secret").validate().is_err());
        assert!(OAuthCredentials::new("bad-id", "secret").validate().is_err());
        assert!(
            OAuthCredentials::new("test.apps.googleusercontent.com", "")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn config_defaults_request_both_scopes() {
        let config = GoogleConfig::new(test_credentials());
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(
            config.scopes,
            vec![
                CALENDAR_READONLY_SCOPE.to_string(),
                CONTACTS_READONLY_SCOPE.to_string()
            ]
        );
        assert!(config.redirect_url.is_none());
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn timeout_is_only_set_on_request() {
        let config = GoogleConfig::new(test_credentials()).with_timeout(Duration::from_secs(12));
        assert_eq!(config.timeout, Some(Duration::from_secs(12)));
    }

    #[test]
    fn missing_redirect_is_configuration_error() {
        let err = GoogleConfig::new(test_credentials()).validate().unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert!(err.message().contains("redirect"));
    }

    #[test]
    fn malformed_redirect_is_rejected() {
        let config = GoogleConfig::new(test_credentials()).with_redirect_url("not a url");
        assert!(config.validate().is_err());
    }

    #[test]
    fn redirect_from_base_appends_callback_path() {
        assert_eq!(
            GoogleConfig::redirect_from_base("https://studio.example.com/"),
            "https://studio.example.com/oauth2callback"
        );
    }

    #[test]
    fn endpoint_base_override() {
        let config = GoogleConfig::new(test_credentials()).with_endpoint_base("http://127.0.0.1:9999/");
        assert_eq!(config.token_url, "http://127.0.0.1:9999/token");
        assert_eq!(config.calendar_api_base, "http://127.0.0.1:9999/calendar/v3");
        assert_eq!(config.people_api_base, "http://127.0.0.1:9999/people/v1");
    }

    #[test]
    fn credentials_from_json_web() {
        let json = r#"{
            "web": {
                "client_id": "web-id.apps.googleusercontent.com",
                "client_secret": "web-secret",
                "redirect_uris": ["https://studio.example.com/oauth2callback"]
            }
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "web-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "web-secret");
    }

    #[test]
    fn credentials_from_json_flat() {
        let json = r#"{
            "client_id": "flat-id.apps.googleusercontent.com",
            "client_secret": "flat-secret"
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "flat-id.apps.googleusercontent.com");
    }

    #[test]
    fn credentials_from_json_invalid() {
        let result = OAuthCredentials::from_json(r#"{ "other": {} }"#);
        assert!(result.unwrap_err().contains("client_id"));
        let result = OAuthCredentials::from_json("not json");
        assert!(result.unwrap_err().contains("parse"));
    }
}

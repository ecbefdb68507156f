//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/promemoria/config.toml` by default.
//!
//! Credential values support secret references:
//! - `pass::path/in/store`, resolved via `pass show`
//! - `env::VAR_NAME`, resolved from the environment
//! - plain text, used as-is

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use promemoria_core::{DEFAULT_TIMEZONE, Region, parse_timezone};
use promemoria_providers::google::{GoogleConfig, OAuthCredentials};
use promemoria_providers::twilio::TwilioConfig;

use crate::secret;

/// Configuration for the promemoria client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Where the studio operates.
    pub deployment: DeploymentSettings,

    /// Google Calendar and Contacts settings.
    pub google: Option<GoogleSettings>,

    /// Twilio WhatsApp settings.
    pub twilio: Option<TwilioSettings>,
}

/// Time zone, phone region and local state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentSettings {
    /// IANA time zone used for "tomorrow" and displayed times.
    pub timezone: String,

    /// ISO-3166 region for numbers without an international prefix.
    pub region: String,

    /// Where the pending authorization is kept between runs.
    pub session_path: Option<PathBuf>,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.name().to_string(),
            region: "IT".to_string(),
            session_path: None,
        }
    }
}

impl DeploymentSettings {
    /// Parses the configured time zone.
    pub fn tz(&self) -> Result<Tz, String> {
        parse_timezone(&self.timezone).map_err(|e| e.to_string())
    }

    /// Parses the configured phone region.
    pub fn region(&self) -> Result<Region, String> {
        self.region.parse().map_err(|e: promemoria_core::PhoneError| e.to_string())
    }

    /// Returns the session file path.
    pub fn session_path(&self) -> PathBuf {
        self.session_path
            .clone()
            .unwrap_or_else(|| ClientConfig::default_data_dir().join("session.json"))
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("promemoria")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("promemoria")
    }

    /// Returns a copy safe to print: literal secrets are masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let Some(ref mut google) = config.google {
            google.client_secret = google.client_secret.as_deref().map(secret::redact);
        }
        if let Some(ref mut twilio) = config.twilio {
            twilio.auth_token = twilio.auth_token.as_deref().map(secret::redact);
        }
        config
    }

    /// Returns the `[google]` section or an explanation of how to add one.
    pub fn google(&self) -> Result<&GoogleSettings, String> {
        self.google.as_ref().ok_or_else(|| {
            format!(
                "Google settings not found. Add to {}:\n  \
                 [google]\n  \
                 credentials_file = \"credentials_web.json\"\n  \
                 base_url = \"https://studio.example.com\"",
                Self::default_path().display()
            )
        })
    }

    /// Returns the `[twilio]` section or an explanation of how to add one.
    pub fn twilio(&self) -> Result<&TwilioSettings, String> {
        self.twilio.as_ref().ok_or_else(|| {
            format!(
                "Twilio settings not found. Add to {}:\n  \
                 [twilio]\n  \
                 account_sid = \"env::TWILIO_ACCOUNT_SID\"\n  \
                 auth_token = \"env::TWILIO_AUTH_TOKEN\"\n  \
                 whatsapp_from = \"+14155238886\"\n  \
                 template_id = \"HX...\"",
                Self::default_path().display()
            )
        })
    }
}

/// Google provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// Cloud Console client secrets JSON, used when the inline pair is absent.
    pub credentials_file: Option<PathBuf>,

    /// Calendar holding the appointments.
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// Full OAuth redirect URL.
    pub redirect_url: Option<String>,

    /// Public base URL; the redirect becomes `<base_url>/oauth2callback`.
    pub base_url: Option<String>,

    /// Path to the stored credential.
    pub token_path: Option<PathBuf>,

    /// HTTP timeout for Google calls.
    pub timeout_secs: Option<u64>,
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

impl GoogleSettings {
    /// Converts to provider configuration.
    ///
    /// Resolves credentials and derives the redirect URL. The result is not
    /// validated here; the authorization coordinator does that on creation.
    pub fn to_provider_config(&self) -> Result<GoogleConfig, String> {
        let mut config =
            GoogleConfig::new(self.resolve_credentials()?).with_calendar_id(&self.calendar_id);

        if let Some(redirect) = self.redirect_target() {
            config = config.with_redirect_url(redirect);
        }

        if let Some(ref path) = self.token_path {
            config = config.with_token_path(path);
        }

        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Returns the explicit redirect URL, or one derived from `base_url`.
    pub fn redirect_target(&self) -> Option<String> {
        self.redirect_url
            .clone()
            .or_else(|| self.base_url.as_deref().map(GoogleConfig::redirect_from_base))
    }

    /// Resolves OAuth client credentials.
    ///
    /// The inline `client_id` / `client_secret` pair wins over
    /// `credentials_file`. Inline values go through secret resolution.
    pub(crate) fn resolve_credentials(&self) -> Result<OAuthCredentials, String> {
        match (&self.client_id, &self.client_secret) {
            (Some(raw_id), Some(raw_secret)) => {
                let id = secret::resolve(raw_id)
                    .map_err(|e| format!("failed to resolve client_id: {}", e))?;
                let secret = secret::resolve(raw_secret)
                    .map_err(|e| format!("failed to resolve client_secret: {}", e))?;
                Ok(OAuthCredentials::new(id, secret))
            }
            (Some(_), None) => {
                Err("client_secret is missing from [google] section in config.toml".to_string())
            }
            (None, Some(_)) => {
                Err("client_id is missing from [google] section in config.toml".to_string())
            }
            (None, None) => match self.credentials_file {
                Some(ref path) => OAuthCredentials::from_file(path).map_err(|e| {
                    format!("failed to load credentials from {}: {}", path.display(), e)
                }),
                None => Err(
                    "Google credentials not found: set client_id/client_secret or credentials_file"
                        .to_string(),
                ),
            },
        }
    }
}

/// Twilio settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TwilioSettings {
    /// Account SID (supports secret references).
    pub account_sid: Option<String>,

    /// Auth token (supports secret references).
    pub auth_token: Option<String>,

    /// WhatsApp-enabled sender number.
    pub whatsapp_from: Option<String>,

    /// Content SID of the reminder template.
    pub template_id: Option<String>,

    /// API base URL override.
    pub api_base: Option<String>,

    /// HTTP timeout for Twilio calls.
    pub timeout_secs: Option<u64>,
}

/// Everything the dispatcher needs from `[twilio]`, resolved.
#[derive(Debug, Clone)]
pub struct ResolvedTwilio {
    /// Provider configuration.
    pub config: TwilioConfig,
    /// Sender number.
    pub from: String,
    /// Template content SID.
    pub template_id: String,
    /// HTTP timeout, if one is configured.
    pub timeout: Option<Duration>,
}

impl TwilioSettings {
    /// Resolves secret references and checks that every field is present.
    pub fn resolve(&self) -> Result<ResolvedTwilio, String> {
        let account_sid = required(&self.account_sid, "account_sid")?;
        let auth_token = required(&self.auth_token, "auth_token")?;
        let from = required(&self.whatsapp_from, "whatsapp_from")?;
        let template_id = required(&self.template_id, "template_id")?;

        let mut config = TwilioConfig::new(account_sid, auth_token);
        if let Some(ref base) = self.api_base {
            config = config.with_api_base(base);
        }

        Ok(ResolvedTwilio {
            config,
            from,
            template_id,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

fn required(value: &Option<String>, field: &str) -> Result<String, String> {
    let raw = value
        .as_deref()
        .ok_or_else(|| format!("{} is missing from [twilio] section in config.toml", field))?;
    let resolved =
        secret::resolve(raw).map_err(|e| format!("failed to resolve {}: {}", field, e))?;
    if resolved.trim().is_empty() {
        return Err(format!("{} in [twilio] must not be empty", field));
    }
    Ok(resolved)
}

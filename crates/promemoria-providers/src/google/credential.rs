//! The delegated-access grant and its on-disk JSON shape.
//!
//! The file layout matches what Google's own client libraries write
//! (`token`, `refresh_token`, `token_uri`, `client_id`, `client_secret`,
//! `scopes`, `expiry`), so a token minted by other tooling can be reused.
//!
//! Expiry is always held as naive UTC. Whatever form the file carries
//! (naive, `Z`, or a numeric offset) is converted on load, so comparisons
//! never mix naive and zone-aware values.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A credential expiring within this margin is treated as expired.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Written form of `expiry`: ISO-8601, no offset suffix.
const EXPIRY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// An access grant for the calendar and contacts APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Short-lived bearer token.
    #[serde(rename = "token")]
    pub access_token: String,

    /// Long-lived token used to mint new access tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Endpoint used for refresh.
    #[serde(rename = "token_uri")]
    pub token_endpoint: String,

    /// OAuth client ID the grant was issued to.
    pub client_id: String,

    /// OAuth client secret, needed for refresh.
    pub client_secret: String,

    /// Granted scopes.
    #[serde(default, deserialize_with = "deserialize_scopes")]
    pub scopes: BTreeSet<String>,

    /// Access token expiry, naive UTC.
    #[serde(default, with = "naive_utc")]
    pub expiry: Option<NaiveDateTime>,
}

impl Credential {
    /// Returns true if the access token is expired or about to expire at `now`.
    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry,
            None => false,
        }
    }

    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().naive_utc())
    }

    /// Returns true if the credential can be used right now.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }

    /// Returns true if a non-empty refresh token is present.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Returns true if every scope in `required` was granted.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Computes an expiry `expires_in_secs` after `now`.
    pub fn expiry_after(now: NaiveDateTime, expires_in_secs: Option<i64>) -> Option<NaiveDateTime> {
        expires_in_secs.map(|secs| now + Duration::seconds(secs))
    }

    /// Updates the credential in place after a successful refresh.
    ///
    /// The refresh token is kept unless the provider rotated it.
    pub fn apply_refresh(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
        rotated_refresh_token: Option<String>,
        now: NaiveDateTime,
    ) {
        self.access_token = access_token.into();
        self.expiry = Self::expiry_after(now, expires_in_secs);
        if let Some(token) = rotated_refresh_token.filter(|t| !t.is_empty()) {
            self.refresh_token = Some(token);
        }
    }
}

/// A timestamp as it may appear in a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredTimestamp {
    /// No zone attached; interpreted as UTC.
    NaiveUtc(NaiveDateTime),
    /// Explicit offset (`Z` or `+HH:MM`).
    Aware(DateTime<FixedOffset>),
}

impl StoredTimestamp {
    /// Parses either form.
    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if let Ok(aware) = DateTime::parse_from_rfc3339(value) {
            return Ok(Self::Aware(aware));
        }
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
            .map(Self::NaiveUtc)
            .map_err(|e| format!("invalid expiry {:?}: {}", value, e))
    }

    /// Converts to the single representation used for comparisons.
    pub fn into_naive_utc(self) -> NaiveDateTime {
        match self {
            Self::NaiveUtc(naive) => naive,
            Self::Aware(aware) => aware.with_timezone(&Utc).naive_utc(),
        }
    }
}

mod naive_utc {
    use super::*;

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(expiry) => serializer.serialize_some(&expiry.format(EXPIRY_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|value| {
            StoredTimestamp::parse(&value)
                .map(StoredTimestamp::into_naive_utc)
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

/// Scopes are written as a list, but a space-separated string or `null` also occur.
fn deserialize_scopes<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scopes {
        List(Vec<String>),
        Spaced(String),
    }

    Ok(match Option::<Scopes>::deserialize(deserializer)? {
        Some(Scopes::List(list)) => list.into_iter().collect(),
        Some(Scopes::Spaced(text)) => text.split_whitespace().map(String::from).collect(),
        None => BTreeSet::new(),
    })
}

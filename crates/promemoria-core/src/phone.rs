//! Phone number normalisation.
//!
//! Contact directories hold phone numbers typed by humans: spaces, dashes,
//! parentheses, national trunk prefixes, the occasional `00` international
//! prefix. [`normalize_phone`] turns such a string into `+<cc><number>` form,
//! and [`E164Phone`] is the only type a reminder will ever be sent to.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use phonenumber::{country, Mode};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Shape every dialable number must have once normalised.
static E164_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[0-9]{6,}$").expect("Invalid E.164 regex"));

/// Errors raised by phone handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    /// The region code is not an ISO-3166 alpha-2 code known to the numbering plan.
    #[error("unknown phone region: {0}")]
    UnknownRegion(String),

    /// The normalised string is not `+` followed by at least six digits.
    #[error("not a dialable number: {0:?}")]
    NotDialable(String),
}

/// Default region used to interpret numbers without an international prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region(country::Id);

impl Region {
    /// Returns the underlying numbering-plan identifier.
    pub fn id(&self) -> country::Id {
        self.0
    }
}

impl Default for Region {
    fn default() -> Self {
        Self(country::Id::IT)
    }
}

impl FromStr for Region {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .to_ascii_uppercase()
            .parse::<country::Id>()
            .map(Self)
            .map_err(|_| PhoneError::UnknownRegion(s.to_string()))
    }
}

/// Normalises a loosely formatted phone number.
///
/// Numbers that the region's numbering plan recognises as valid are
/// formatted as E.164. Anything else goes through a lossy fallback that
/// keeps digits only, rewrites a leading `00` to `+` and prepends `+` when
/// missing. The fallback may produce a number that is not dialable; callers
/// check the result with [`E164Phone::parse`].
pub fn normalize_phone(raw: &str, region: Region) -> String {
    if let Ok(number) = phonenumber::parse(Some(region.id()), raw)
        && phonenumber::is_valid(&number)
    {
        return number.format().mode(Mode::E164).to_string();
    }

    let fallback = strip_to_digits(raw);
    debug!(raw = %raw, normalized = %fallback, "phone not valid for region, using fallback");
    fallback
}

fn strip_to_digits(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();

    if trimmed.starts_with('+') {
        format!("+{digits}")
    } else if let Some(rest) = digits.strip_prefix("00") {
        format!("+{rest}")
    } else {
        format!("+{digits}")
    }
}

/// A phone number in `+<digits>` form with at least six digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct E164Phone(String);

impl E164Phone {
    /// Validates an already normalised string.
    pub fn parse(normalized: impl Into<String>) -> Result<Self, PhoneError> {
        let normalized = normalized.into();
        if E164_REGEX.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(PhoneError::NotDialable(normalized))
        }
    }

    /// Normalises `raw` and validates the result in one step.
    pub fn from_raw(raw: &str, region: Region) -> Result<Self, PhoneError> {
        Self::parse(normalize_phone(raw, region))
    }

    /// Returns the number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for E164Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<E164Phone> for String {
    fn from(phone: E164Phone) -> Self {
        phone.0
    }
}

impl fmt::Display for E164Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

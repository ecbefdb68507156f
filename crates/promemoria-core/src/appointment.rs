//! Appointment types produced by resolution.
//!
//! A calendar event becomes either a [`ResolvedAppointment`] (something we can
//! send a reminder to) or a [`ResolutionFailure`] (a diagnostic). Both are
//! collected into a [`Resolution`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::phone::E164Phone;

/// An appointment ready for a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAppointment {
    /// Display name of the matched contact.
    pub name: String,
    /// Event start exactly as the calendar reported it (original offset kept).
    pub start: String,
    /// Destination number.
    pub phone_e164: E164Phone,
}

/// Why an event could not be turned into a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No contact matched the event title.
    NoContactMatch,
    /// The contact's phone did not normalise to a dialable number.
    BadPhoneFormat,
    /// The contacts directory returned an error for this lookup.
    ContactLookupFailed,
}

impl FailureReason {
    /// Returns the snake_case name of this reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoContactMatch => "no_contact_match",
            Self::BadPhoneFormat => "bad_phone_format",
            Self::ContactLookupFailed => "contact_lookup_failed",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic record for an event that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionFailure {
    /// Title of the calendar event.
    pub event_title: String,
    /// The phone as stored on the contact, when one was found.
    pub raw_phone: Option<String>,
    /// Failure category.
    pub reason: FailureReason,
}

impl ResolutionFailure {
    /// Creates a failure for an event without a matching contact.
    pub fn no_contact_match(event_title: impl Into<String>) -> Self {
        Self {
            event_title: event_title.into(),
            raw_phone: None,
            reason: FailureReason::NoContactMatch,
        }
    }

    /// Creates a failure for a contact whose phone is unusable.
    pub fn bad_phone_format(event_title: impl Into<String>, raw_phone: Option<String>) -> Self {
        Self {
            event_title: event_title.into(),
            raw_phone,
            reason: FailureReason::BadPhoneFormat,
        }
    }

    /// Creates a failure for a lookup the directory could not answer.
    pub fn contact_lookup_failed(event_title: impl Into<String>) -> Self {
        Self {
            event_title: event_title.into(),
            raw_phone: None,
            reason: FailureReason::ContactLookupFailed,
        }
    }
}

/// Outcome of resolving one day's events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Appointments in chronological order.
    pub appointments: Vec<ResolvedAppointment>,
    /// Events that were skipped.
    pub failures: Vec<ResolutionFailure>,
}

impl Resolution {
    /// Returns true when there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_reason_serializes_snake_case() {
        let failure = ResolutionFailure::bad_phone_format("Mario", Some("12".to_string()));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["reason"], "bad_phone_format");
        assert_eq!(json["raw_phone"], "12");
    }

    #[test]
    fn appointment_rejects_bad_phone_on_deserialize() {
        let json = r#"{"name":"Maria","start":"2025-10-12T15:00:00+02:00","phone_e164":"333"}"#;
        assert!(serde_json::from_str::<ResolvedAppointment>(json).is_err());
    }

    #[test]
    fn empty_resolution() {
        let resolution = Resolution::default();
        assert!(resolution.is_empty());
        assert!(resolution.failures.is_empty());
    }
}

//! Appointment resolution: tomorrow's events to reminder targets.
//!
//! Each event title is used as a contact search key. The first match's
//! first phone number is normalised; events that cannot be resolved are
//! recorded as [`ResolutionFailure`]s and never abort the batch.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use promemoria_core::{
    E164Phone, Region, Resolution, ResolutionFailure, ResolvedAppointment, TomorrowWindow,
};
use promemoria_providers::{CalendarEvent, CalendarSource, ContactDirectory, EventQuery};

use crate::error::ClientResult;

/// Resolves one day's calendar events against the contacts directory.
pub struct AppointmentResolver<'a> {
    calendar: &'a dyn CalendarSource,
    contacts: &'a dyn ContactDirectory,
    calendar_id: String,
    tz: Tz,
    region: Region,
}

impl<'a> AppointmentResolver<'a> {
    /// Creates a resolver.
    pub fn new(
        calendar: &'a dyn CalendarSource,
        contacts: &'a dyn ContactDirectory,
        calendar_id: impl Into<String>,
        tz: Tz,
        region: Region,
    ) -> Self {
        Self {
            calendar,
            contacts,
            calendar_id: calendar_id.into(),
            tz,
            region,
        }
    }

    /// Lists tomorrow's events (relative to `now` in the deployment zone) and
    /// resolves each one.
    ///
    /// Only a failure to list the calendar is an error. Appointments keep the
    /// calendar's chronological order.
    pub async fn resolve_tomorrows_appointments(
        &self,
        now: DateTime<Utc>,
    ) -> ClientResult<Resolution> {
        let window = TomorrowWindow::compute(now, self.tz)?;
        let query = EventQuery::for_window(&self.calendar_id, &window);
        debug!(time_min = %query.time_min, time_max = %query.time_max, "listing events");

        let events = self.calendar.list_events(query).await?;
        let mut resolution = Resolution::default();

        for event in events {
            if !in_window(&event, &window) {
                continue;
            }
            match self.resolve_event(&event).await {
                Ok(appointment) => resolution.appointments.push(appointment),
                Err(failure) => {
                    warn!(event = %failure.event_title, reason = %failure.reason, "event not resolved");
                    resolution.failures.push(failure);
                }
            }
        }

        debug!(
            resolved = resolution.appointments.len(),
            failed = resolution.failures.len(),
            "resolution finished"
        );
        Ok(resolution)
    }

    async fn resolve_event(
        &self,
        event: &CalendarEvent,
    ) -> Result<ResolvedAppointment, ResolutionFailure> {
        let title = event.title.trim();
        if title.is_empty() {
            return Err(ResolutionFailure::no_contact_match(&event.title));
        }

        let matches = self.contacts.search(title).await.map_err(|e| {
            warn!(event = %title, error = %e, "contact search failed");
            ResolutionFailure::contact_lookup_failed(&event.title)
        })?;

        let contact = matches
            .into_iter()
            .next()
            .ok_or_else(|| ResolutionFailure::no_contact_match(&event.title))?;

        let raw_phone = contact
            .phone_raw
            .ok_or_else(|| ResolutionFailure::bad_phone_format(&event.title, None))?;

        let phone_e164 = E164Phone::from_raw(&raw_phone, self.region)
            .map_err(|_| ResolutionFailure::bad_phone_format(&event.title, Some(raw_phone)))?;

        Ok(ResolvedAppointment {
            name: contact
                .display_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| event.title.clone()),
            start: event.start.clone(),
            phone_e164,
        })
    }
}

fn in_window(event: &CalendarEvent, window: &TomorrowWindow) -> bool {
    match event.parsed_start() {
        Ok(start) if window.contains(&start) => true,
        Ok(_) => {
            debug!(event = %event.title, start = %event.start, "outside tomorrow, skipping");
            false
        }
        Err(e) => {
            warn!(event = %event.title, error = %e, "unparsable start, skipping");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promemoria_core::FailureReason;
    use promemoria_providers::{BoxFuture, ContactRecord, ProviderError, ProviderResult};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeCalendar {
        events: ProviderResult<Vec<CalendarEvent>>,
        queries: Mutex<Vec<EventQuery>>,
    }

    impl FakeCalendar {
        fn with(events: Vec<CalendarEvent>) -> Self {
            Self {
                events: Ok(events),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl CalendarSource for FakeCalendar {
        fn list_events(
            &self,
            query: EventQuery,
        ) -> BoxFuture<'_, ProviderResult<Vec<CalendarEvent>>> {
            self.queries.lock().unwrap().push(query);
            let result = match &self.events {
                Ok(events) => Ok(events.clone()),
                Err(e) => Err(ProviderError::new(e.code(), e.message())),
            };
            Box::pin(async move { result })
        }
    }

    #[derive(Default)]
    struct FakeContacts {
        entries: HashMap<String, Vec<ContactRecord>>,
        failing: Vec<String>,
    }

    impl FakeContacts {
        fn add(mut self, query: &str, record: ContactRecord) -> Self {
            self.entries.entry(query.to_string()).or_default().push(record);
            self
        }
    }

    impl ContactDirectory for FakeContacts {
        fn search<'a>(
            &'a self,
            name: &'a str,
        ) -> BoxFuture<'a, ProviderResult<Vec<ContactRecord>>> {
            Box::pin(async move {
                if self.failing.iter().any(|f| f == name) {
                    return Err(ProviderError::server("people API unavailable"));
                }
                Ok(self.entries.get(name).cloned().unwrap_or_default())
            })
        }
    }

    // 2025-10-11 10:00 in Rome
    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-10-11T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn resolver<'a>(
        calendar: &'a FakeCalendar,
        contacts: &'a FakeContacts,
    ) -> AppointmentResolver<'a> {
        AppointmentResolver::new(
            calendar,
            contacts,
            "primary",
            chrono_tz::Europe::Rome,
            Region::default(),
        )
    }

    #[tokio::test]
    async fn resolves_known_patient() {
        let calendar = FakeCalendar::with(vec![CalendarEvent::new(
            "Maria Rossi",
            "2025-10-12T15:00:00+02:00",
        )]);
        let contacts =
            FakeContacts::default().add("Maria Rossi", ContactRecord::new("Maria Rossi", "333 1234567"));

        let resolution = resolver(&calendar, &contacts)
            .resolve_tomorrows_appointments(now())
            .await
            .unwrap();

        assert!(resolution.failures.is_empty());
        assert_eq!(
            resolution.appointments,
            vec![ResolvedAppointment {
                name: "Maria Rossi".to_string(),
                start: "2025-10-12T15:00:00+02:00".to_string(),
                phone_e164: E164Phone::parse("+393331234567").unwrap(),
            }]
        );

        let queries = calendar.queries.lock().unwrap();
        assert_eq!(queries[0].calendar_id, "primary");
        assert_eq!(queries[0].time_min, "2025-10-12T00:00:00+02:00");
        assert_eq!(queries[0].time_max, "2025-10-12T23:59:59+02:00");
    }

    #[tokio::test]
    async fn unknown_person_is_a_failure_not_an_error() {
        let calendar = FakeCalendar::with(vec![CalendarEvent::new(
            "Unknown Person",
            "2025-10-12T09:30:00+02:00",
        )]);
        let contacts = FakeContacts::default();

        let resolution = resolver(&calendar, &contacts)
            .resolve_tomorrows_appointments(now())
            .await
            .unwrap();

        assert!(resolution.appointments.is_empty());
        assert_eq!(
            resolution.failures,
            vec![ResolutionFailure::no_contact_match("Unknown Person")]
        );
    }

    #[tokio::test]
    async fn empty_calendar_is_empty_resolution() {
        let calendar = FakeCalendar::with(Vec::new());
        let contacts = FakeContacts::default();

        let resolution = resolver(&calendar, &contacts)
            .resolve_tomorrows_appointments(now())
            .await
            .unwrap();

        assert!(resolution.is_empty());
        assert!(resolution.failures.is_empty());
    }

    #[tokio::test]
    async fn calendar_error_propagates() {
        let calendar = FakeCalendar {
            events: Err(ProviderError::authentication("token revoked")),
            queries: Mutex::new(Vec::new()),
        };
        let contacts = FakeContacts::default();

        assert!(
            resolver(&calendar, &contacts)
                .resolve_tomorrows_appointments(now())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn one_bad_event_does_not_stop_the_batch() {
        let calendar = FakeCalendar::with(vec![
            CalendarEvent::new("Paolo Verdi", "2025-10-12T08:00:00+02:00"),
            CalendarEvent::new("Senza Numero", "2025-10-12T09:00:00+02:00"),
            CalendarEvent::new("Numero Rotto", "2025-10-12T10:00:00+02:00"),
            CalendarEvent::new("Rubrica Giù", "2025-10-12T11:00:00+02:00"),
            CalendarEvent::new("Luca Bianchi", "2025-10-12T12:00:00+02:00"),
        ]);
        let contacts = FakeContacts {
            failing: vec!["Rubrica Giù".to_string()],
            ..FakeContacts::default()
        }
        .add("Paolo Verdi", ContactRecord::new("Paolo Verdi", "+39 347 765 4321"))
        .add(
            "Senza Numero",
            ContactRecord {
                display_name: Some("Senza Numero".to_string()),
                phone_raw: None,
            },
        )
        .add("Numero Rotto", ContactRecord::new("Numero Rotto", "12345"))
        .add("Luca Bianchi", ContactRecord::new("Luca Bianchi", "0039 333 7654321"));

        let resolution = resolver(&calendar, &contacts)
            .resolve_tomorrows_appointments(now())
            .await
            .unwrap();

        let names: Vec<_> = resolution.appointments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Paolo Verdi", "Luca Bianchi"]);
        assert_eq!(resolution.appointments[1].phone_e164.as_str(), "+393337654321");

        let reasons: Vec<_> = resolution.failures.iter().map(|f| f.reason).collect();
        assert_eq!(
            reasons,
            vec![
                FailureReason::BadPhoneFormat,
                FailureReason::BadPhoneFormat,
                FailureReason::ContactLookupFailed,
            ]
        );
        assert_eq!(resolution.failures[0].raw_phone, None);
        assert_eq!(resolution.failures[1].raw_phone.as_deref(), Some("12345"));
    }

    #[tokio::test]
    async fn events_outside_tomorrow_are_ignored() {
        let calendar = FakeCalendar::with(vec![
            CalendarEvent::new("Maria Rossi", "2025-10-13T00:30:00+02:00"),
            CalendarEvent::new("Maria Rossi", "garbage"),
        ]);
        let contacts =
            FakeContacts::default().add("Maria Rossi", ContactRecord::new("Maria Rossi", "3331234567"));

        let resolution = resolver(&calendar, &contacts)
            .resolve_tomorrows_appointments(now())
            .await
            .unwrap();

        assert!(resolution.appointments.is_empty());
        assert!(resolution.failures.is_empty());
    }

    #[tokio::test]
    async fn contact_without_name_uses_event_title() {
        let calendar = FakeCalendar::with(vec![CalendarEvent::new("Anna Neri", "2025-10-12")]);
        let contacts = FakeContacts::default().add(
            "Anna Neri",
            ContactRecord {
                display_name: None,
                phone_raw: Some("3331112222".to_string()),
            },
        );

        let resolution = resolver(&calendar, &contacts)
            .resolve_tomorrows_appointments(now())
            .await
            .unwrap();

        assert_eq!(resolution.appointments[0].name, "Anna Neri");
        assert_eq!(resolution.appointments[0].start, "2025-10-12");
    }
}

//! Read-only calendar interface.
//!
//! The resolver only needs one query: the concrete (recurrence-expanded)
//! events of a calendar between two bounds, ordered by start time.

use std::future::Future;
use std::pin::Pin;

use promemoria_core::{EventStart, TimeError, TomorrowWindow};

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Boxed futures keep the collaborator traits object-safe so the resolver
/// can hold `&dyn CalendarSource` and tests can swap in fakes.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A calendar event as far as reminders are concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    /// Event title; used as the contact search key.
    pub title: String,
    /// Start as reported by the calendar: RFC 3339 with offset, or `YYYY-MM-DD`.
    pub start: String,
}

impl CalendarEvent {
    /// Creates a new event.
    pub fn new(title: impl Into<String>, start: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start: start.into(),
        }
    }

    /// Parses the start.
    pub fn parsed_start(&self) -> Result<EventStart, TimeError> {
        EventStart::parse(&self.start)
    }
}

/// Query for [`CalendarSource::list_events`].
#[derive(Debug, Clone)]
pub struct EventQuery {
    /// Calendar to read from.
    pub calendar_id: String,
    /// Lower bound, RFC 3339 with offset.
    pub time_min: String,
    /// Upper bound, RFC 3339 with offset.
    pub time_max: String,
}

impl EventQuery {
    /// Builds the query covering a [`TomorrowWindow`].
    pub fn for_window(calendar_id: impl Into<String>, window: &TomorrowWindow) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            time_min: window.time_min(),
            time_max: window.time_max(),
        }
    }
}

/// Source of calendar events.
///
/// Implementations must expand recurring events into concrete instances,
/// order results by start time and follow pagination internally.
pub trait CalendarSource: Send + Sync {
    /// Lists events between `query.time_min` and `query.time_max`.
    fn list_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<CalendarEvent>>>;
}

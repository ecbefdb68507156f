//! Google Calendar API v3 event listing.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::calendar::{BoxFuture, CalendarEvent, CalendarSource, EventQuery};
use crate::error::ProviderResult;

use super::credential::Credential;
use super::http::GoogleApi;

/// Google Calendar API client bound to one access token.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    api: GoogleApi,
}

impl GoogleCalendarClient {
    /// Creates a client for the Calendar API at `api_base`.
    pub fn new(
        credential: &Credential,
        api_base: impl Into<String>,
        timeout: Option<Duration>,
    ) -> ProviderResult<Self> {
        Ok(Self {
            api: GoogleApi::new(credential, api_base, timeout)?,
        })
    }

    async fn fetch(&self, query: EventQuery) -> ProviderResult<Vec<CalendarEvent>> {
        let url = self.api.url(&format!(
            "/calendars/{}/events",
            urlencoding::encode(&query.calendar_id)
        ));

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("timeMin", query.time_min.clone()),
                ("timeMax", query.time_max.clone()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }

            let page: EventListResponse = self.api.get_json(&url, &params).await?;
            events.extend(page.items.into_iter().filter_map(convert_event));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(
            "fetched {} events from calendar {}",
            events.len(),
            query.calendar_id
        );
        Ok(events)
    }
}

impl CalendarSource for GoogleCalendarClient {
    fn list_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<CalendarEvent>>> {
        Box::pin(self.fetch(query))
    }
}

/// Keeps the title and the start exactly as the API reported them.
fn convert_event(event: ApiEvent) -> Option<CalendarEvent> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let start = match event.start {
        Some(EventDateTime {
            date_time: Some(date_time),
            ..
        }) => date_time,
        Some(EventDateTime {
            date: Some(date), ..
        }) => date,
        _ => {
            warn!("event {:?} has no start, skipping", event.id);
            return None;
        }
    };

    Some(CalendarEvent::new(event.summary.unwrap_or_default(), start))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiEvent {
    id: Option<String>,
    status: Option<String>,
    summary: Option<String>,
    start: Option<EventDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDateTime {
    date_time: Option<String>,
    date: Option<String>,
}

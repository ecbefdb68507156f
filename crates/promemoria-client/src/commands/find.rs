//! `promemoria find`: show tomorrow's appointments.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use promemoria_core::Resolution;
use promemoria_providers::google::{GoogleCalendarClient, GooglePeopleClient};

use crate::cli::CallbackArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::render;
use crate::resolve::AppointmentResolver;

/// Tomorrow's appointments, with what is needed to display them.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Resolved appointments and failures.
    pub resolution: Resolution,
    /// Deployment time zone.
    pub tz: Tz,
    /// Today's date in `tz` when discovery ran.
    pub today: NaiveDate,
}

impl Discovery {
    /// Prints the summary to stdout and failures to stderr.
    pub fn print(&self) {
        println!(
            "{}",
            render::render_summary(&self.resolution, &self.tz, self.today)
        );
        let failures = render::render_failures(&self.resolution.failures);
        if !failures.is_empty() {
            eprintln!();
            eprintln!("{}", failures);
        }
    }
}

/// Authorizes, then resolves tomorrow's appointments.
pub async fn discover(config: &ClientConfig, callback: &CallbackArgs) -> ClientResult<Discovery> {
    let tz = config.deployment.tz().map_err(ClientError::Config)?;
    let region = config.deployment.region().map_err(ClientError::Config)?;

    let (google, credential) = super::require_credential(config, callback).await?;

    let calendar =
        GoogleCalendarClient::new(&credential, &google.calendar_api_base, google.timeout)?;
    let people = GooglePeopleClient::new(&credential, &google.people_api_base, google.timeout)?;

    let now = Utc::now();
    let resolution = AppointmentResolver::new(&calendar, &people, &google.calendar_id, tz, region)
        .resolve_tomorrows_appointments(now)
        .await?;

    Ok(Discovery {
        resolution,
        tz,
        today: now.with_timezone(&tz).date_naive(),
    })
}

/// Runs `find`.
pub async fn run(config: &ClientConfig, callback: &CallbackArgs, json: bool) -> ClientResult<()> {
    let discovery = discover(config, callback).await?;

    if json {
        let out = serde_json::to_string_pretty(&discovery.resolution)
            .map_err(std::io::Error::from)?;
        println!("{}", out);
    } else {
        discovery.print();
    }
    Ok(())
}

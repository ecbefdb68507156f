//! `promemoria send`: confirm, then send tomorrow's reminders.

use inquire::Confirm;
use tracing::info;

use promemoria_providers::twilio::TwilioClient;

use crate::cli::CallbackArgs;
use crate::config::ClientConfig;
use crate::dispatch::ReminderDispatcher;
use crate::error::{ClientError, ClientResult};
use crate::render;

use super::find;

/// Runs `send`.
///
/// Discovery runs again so the operator confirms exactly what is sent.
/// Nothing is sent when no appointment was resolved.
pub async fn run(config: &ClientConfig, callback: &CallbackArgs, yes: bool) -> ClientResult<()> {
    let twilio = config
        .twilio()
        .and_then(|t| t.resolve())
        .map_err(ClientError::Config)?;
    let sender = TwilioClient::new(twilio.config.clone(), twilio.timeout)?;

    let discovery = find::discover(config, callback).await?;
    discovery.print();

    let appointments = &discovery.resolution.appointments;
    if appointments.is_empty() {
        println!("Nessun promemoria da inviare.");
        return Ok(());
    }

    if !yes && !confirm(appointments.len())? {
        println!("Invio annullato.");
        return Ok(());
    }

    let report = ReminderDispatcher::new(&sender, twilio.from, twilio.template_id, discovery.tz)
        .send_reminders(appointments)
        .await;
    info!(
        attempted = report.attempted,
        accepted = report.accepted,
        "dispatch finished"
    );

    println!();
    println!("{}", render::render_report(&report));
    Ok(())
}

fn confirm(count: usize) -> ClientResult<bool> {
    Ok(Confirm::new(&format!("Inviare {} promemoria su WhatsApp?", count))
        .with_default(false)
        .prompt()?)
}

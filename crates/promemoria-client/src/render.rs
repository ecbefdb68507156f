//! Operator-facing text, in Italian.

use chrono::NaiveDate;
use chrono_tz::Tz;

use promemoria_core::{FailureReason, Resolution, ResolutionFailure, format_italian_start};

use crate::dispatch::DispatchReport;

/// Shown when the calendar has nothing resolvable for tomorrow.
pub const EMPTY_SUMMARY: &str = "Non ho trovato nessun paziente per domani";

/// Heading above the appointment list.
pub const SUMMARY_HEADER: &str = "Ho trovato questi appuntamenti:";

/// Shown after every dispatch, whatever the individual outcomes.
pub const SENT_CONFIRMATION: &str = "Messaggi inviati";

/// [`SUMMARY_HEADER`], then one line per appointment:
/// `- **Maria Rossi**: Domani 12 Ottobre alle 15:00`.
pub fn render_summary(resolution: &Resolution, tz: &Tz, today: NaiveDate) -> String {
    if resolution.appointments.is_empty() {
        return EMPTY_SUMMARY.to_string();
    }

    let mut lines = vec![SUMMARY_HEADER.to_string()];
    lines.extend(resolution.appointments.iter().map(|appointment| {
        let when = format_italian_start(&appointment.start, tz, today)
            .unwrap_or_else(|_| appointment.start.clone());
        format!("- **{}**: {}", appointment.name, when)
    }));
    lines.join("\n")
}

/// Lists events that will not get a reminder. Empty when there are none.
pub fn render_failures(failures: &[ResolutionFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }

    let mut lines = vec!["Eventi senza promemoria:".to_string()];
    lines.extend(failures.iter().map(|failure| {
        let why = match failure.reason {
            FailureReason::NoContactMatch => "nessun contatto corrispondente".to_string(),
            FailureReason::BadPhoneFormat => match failure.raw_phone {
                Some(ref raw) => format!("numero non valido ({})", raw),
                None => "contatto senza numero".to_string(),
            },
            FailureReason::ContactLookupFailed => "ricerca in rubrica non riuscita".to_string(),
        };
        format!("- {}: {}", failure.event_title, why)
    }));
    lines.join("\n")
}

/// Final dispatch summary, always ending with [`SENT_CONFIRMATION`].
pub fn render_report(report: &DispatchReport) -> String {
    let mut lines = Vec::new();
    for rejection in &report.rejections {
        lines.push(format!(
            "- non inviato a {} ({}): {}",
            rejection.name, rejection.phone, rejection.reason
        ));
    }
    lines.push(format!(
        "{} ({} su {})",
        SENT_CONFIRMATION, report.accepted, report.attempted
    ));
    lines.join("\n")
}

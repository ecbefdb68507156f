//! Reminder dispatch.
//!
//! One templated WhatsApp message per appointment, sent sequentially in
//! chronological order. A rejected message is logged and recorded; it never
//! stops the rest of the batch. Nothing is retried.

use std::collections::BTreeMap;

use chrono_tz::Tz;
use serde::Serialize;
use tracing::{info, warn};

use promemoria_core::{ResolvedAppointment, local_clock_time};
use promemoria_providers::{MessageSender, OutboundMessage};

/// Template placeholder that receives the local start time.
pub const TIME_VARIABLE: &str = "1";

/// One message that was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchRejection {
    /// Patient name.
    pub name: String,
    /// Destination number.
    pub phone: String,
    /// What went wrong.
    pub reason: String,
}

/// Summary of a dispatch run, for the operator only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Appointments handed to the dispatcher.
    pub attempted: usize,
    /// Messages the provider accepted.
    pub accepted: usize,
    /// Messages that were not sent.
    pub rejections: Vec<DispatchRejection>,
}

/// Sends reminders through a [`MessageSender`].
pub struct ReminderDispatcher<'a> {
    sender: &'a dyn MessageSender,
    from: String,
    template_id: String,
    tz: Tz,
}

impl<'a> ReminderDispatcher<'a> {
    /// Creates a dispatcher.
    pub fn new(
        sender: &'a dyn MessageSender,
        from: impl Into<String>,
        template_id: impl Into<String>,
        tz: Tz,
    ) -> Self {
        Self {
            sender,
            from: from.into(),
            template_id: template_id.into(),
            tz,
        }
    }

    /// Sends one reminder per appointment.
    ///
    /// The template variable is the start time as `HH:MM` in the deployment
    /// zone. All-day appointments have no time and are skipped as rejections.
    pub async fn send_reminders(&self, appointments: &[ResolvedAppointment]) -> DispatchReport {
        let mut report = DispatchReport {
            attempted: appointments.len(),
            ..DispatchReport::default()
        };

        for appointment in appointments {
            match self.send_one(appointment).await {
                Ok(message_id) => {
                    info!(name = %appointment.name, message_id = %message_id, "reminder accepted");
                    report.accepted += 1;
                }
                Err(reason) => {
                    warn!(name = %appointment.name, reason = %reason, "reminder not sent");
                    report.rejections.push(DispatchRejection {
                        name: appointment.name.clone(),
                        phone: appointment.phone_e164.to_string(),
                        reason,
                    });
                }
            }
        }

        report
    }

    async fn send_one(&self, appointment: &ResolvedAppointment) -> Result<String, String> {
        let time = local_clock_time(&appointment.start, &self.tz).map_err(|e| e.to_string())?;

        let message = OutboundMessage {
            from: self.from.clone(),
            template_id: self.template_id.clone(),
            variables: BTreeMap::from([(TIME_VARIABLE.to_string(), time)]),
            to: appointment.phone_e164.clone(),
        };

        self.sender
            .submit(&message)
            .await
            .map(|receipt| receipt.message_id)
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promemoria_core::E164Phone;
    use promemoria_providers::{BoxFuture, ProviderError, ProviderResult, SubmissionReceipt};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<OutboundMessage>>,
        reject: Vec<String>,
    }

    impl MessageSender for RecordingSender {
        fn submit<'a>(
            &'a self,
            message: &'a OutboundMessage,
        ) -> BoxFuture<'a, ProviderResult<SubmissionReceipt>> {
            Box::pin(async move {
                if self.reject.iter().any(|r| r == message.to.as_str()) {
                    return Err(ProviderError::delivery("twilio error 63016: outside window"));
                }
                let mut sent = self.sent.lock().unwrap();
                sent.push(message.clone());
                Ok(SubmissionReceipt {
                    message_id: format!("SM{}", sent.len()),
                    status: Some("queued".to_string()),
                })
            })
        }
    }

    fn appointment(name: &str, start: &str, phone: &str) -> ResolvedAppointment {
        ResolvedAppointment {
            name: name.to_string(),
            start: start.to_string(),
            phone_e164: E164Phone::parse(phone).unwrap(),
        }
    }

    fn dispatcher(sender: &RecordingSender) -> ReminderDispatcher<'_> {
        ReminderDispatcher::new(sender, "+14155238886", "HX0001", chrono_tz::Europe::Rome)
    }

    #[tokio::test]
    async fn sends_local_time_as_template_variable() {
        let sender = RecordingSender::default();
        let report = dispatcher(&sender)
            .send_reminders(&[appointment(
                "Maria Rossi",
                "2025-10-12T13:00:00Z",
                "+393331234567",
            )])
            .await;

        assert_eq!(report.attempted, 1);
        assert_eq!(report.accepted, 1);
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent[0].variables.get("1").map(String::as_str), Some("15:00"));
        assert_eq!(sent[0].from, "+14155238886");
        assert_eq!(sent[0].template_id, "HX0001");
        assert_eq!(sent[0].to.as_str(), "+393331234567");
    }

    #[tokio::test]
    async fn one_rejection_does_not_stop_the_batch() {
        let sender = RecordingSender {
            reject: vec!["+393330000000".to_string()],
            ..RecordingSender::default()
        };
        let report = dispatcher(&sender)
            .send_reminders(&[
                appointment("Primo", "2025-10-12T09:00:00+02:00", "+393331111111"),
                appointment("Rifiutato", "2025-10-12T10:00:00+02:00", "+393330000000"),
                appointment("Terzo", "2025-10-12T11:00:00+02:00", "+393332222222"),
            ])
            .await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejections.len(), 1);
        assert_eq!(report.rejections[0].name, "Rifiutato");
        assert!(report.rejections[0].reason.contains("63016"));

        let order: Vec<_> = sender
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.variables["1"].clone())
            .collect();
        assert_eq!(order, vec!["09:00", "11:00"]);
    }

    #[tokio::test]
    async fn all_day_appointment_is_skipped() {
        let sender = RecordingSender::default();
        let report = dispatcher(&sender)
            .send_reminders(&[appointment("Tutto il giorno", "2025-10-12", "+393331234567")])
            .await;

        assert_eq!(report.accepted, 0);
        assert_eq!(report.rejections.len(), 1);
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn nothing_to_send() {
        let sender = RecordingSender::default();
        assert_eq!(dispatcher(&sender).send_reminders(&[]).await, DispatchReport::default());
    }
}

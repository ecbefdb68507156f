//! Outbound messaging interface.

use std::collections::BTreeMap;

use promemoria_core::E164Phone;

use crate::calendar::BoxFuture;
use crate::error::ProviderResult;

/// One templated message to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Sender number registered with the provider.
    pub from: String,
    /// Provider-side template identifier.
    pub template_id: String,
    /// Template variables, keyed by placeholder name.
    pub variables: BTreeMap<String, String>,
    /// Destination.
    pub to: E164Phone,
}

/// Receipt for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Provider-assigned message identifier.
    pub message_id: String,
    /// Provider status at acceptance time (e.g. `queued`).
    pub status: Option<String>,
}

/// A channel that accepts messages for delivery.
///
/// Acceptance means the provider queued the message, not that it was delivered.
pub trait MessageSender: Send + Sync {
    /// Submits one message.
    fn submit<'a>(
        &'a self,
        message: &'a OutboundMessage,
    ) -> BoxFuture<'a, ProviderResult<SubmissionReceipt>>;
}

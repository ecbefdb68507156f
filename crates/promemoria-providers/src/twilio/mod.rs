//! Twilio WhatsApp provider.
//!
//! Reminders are sent as pre-approved WhatsApp content templates. The
//! template is referenced by its content SID and filled from a JSON map of
//! positional variables (`{"1": "15:00"}`).

mod client;

pub use client::{TwilioClient, TwilioConfig};

//! External collaborators of the reminder pipeline.
//!
//! This crate holds everything that talks to the outside world:
//!
//! - [`CalendarSource`], [`ContactDirectory`] and [`MessageSender`]: the
//!   seams the pipeline is written against
//! - [`google`]: OAuth credential lifecycle, Calendar and People clients
//! - [`twilio`]: WhatsApp template delivery
//! - [`ProviderError`]: the shared error type
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Calendar API │   │  People API  │   │   Twilio     │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        │                  │                  │
//!        ▼                  ▼                  ▼
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │CalendarSource│   │ContactDirect.│   │MessageSender │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        └────── resolver ──┘                  │
//!                    │                         │
//!                    ▼                         │
//!          ResolvedAppointment ─── dispatcher ─┘
//! ```

pub mod calendar;
pub mod contacts;
pub mod error;
pub mod google;
mod http;
pub mod messaging;
pub mod twilio;

pub use calendar::{BoxFuture, CalendarEvent, CalendarSource, EventQuery};
pub use contacts::{ContactDirectory, ContactRecord};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use messaging::{MessageSender, OutboundMessage, SubmissionReceipt};

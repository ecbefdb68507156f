//! Core types: phone normalisation, time windows, appointments, formatting

pub mod appointment;
pub mod format;
pub mod phone;
pub mod time;
pub mod tracing;

pub use appointment::{FailureReason, Resolution, ResolutionFailure, ResolvedAppointment};
pub use format::{format_italian_start, italian_month};
pub use phone::{normalize_phone, E164Phone, PhoneError, Region};
pub use time::{
    local_clock_time, parse_timezone, EventStart, TimeError, TomorrowWindow, DEFAULT_TIMEZONE,
};
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};

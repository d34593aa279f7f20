//! # Reminders Feature
//!
//! "Pick a dish later" text reminders: scheduling and dispatch.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: true (dispatch requires Twilio credentials)

pub mod dispatcher;
pub mod scheduler;

pub use dispatcher::{compose_message, ReminderDispatcher, SendOutcome, SweepReport};
pub use scheduler::{effective_delay_hours, ReminderRequest, ReminderScheduler, DEFAULT_REMINDER_DELAY_HOURS};

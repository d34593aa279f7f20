//! # Event Feature
//!
//! Host-managed event details and category targets.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod settings;

pub use settings::{validate, EventSeed, EventSettings, MAX_REMINDER_DELAY_HOURS, MIN_REMINDER_DELAY_HOURS};

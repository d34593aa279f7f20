//! # Reminder Scheduler
//!
//! Creates a pending reminder for a guest who chose to pick a dish later. The
//! due time is `now + delay`, where the delay comes from the event
//! configuration and is clamped to a sane range.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Delay clamped to 1..=168 hours
//! - 1.0.0: Initial scheduling with 24h default

use crate::core::{PendingReminder, PotluckError, PotluckResult};
use crate::database::{keys, BlobStore, Collection};
use crate::features::event::{EventSettings, MAX_REMINDER_DELAY_HOURS, MIN_REMINDER_DELAY_HOURS};
use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_REMINDER_DELAY_HOURS: i64 = 24;

/// Unset or non-positive delays fall back to the default; others are clamped
pub fn effective_delay_hours(configured: Option<i64>) -> i64 {
    match configured {
        Some(hours) if hours > 0 => hours.clamp(MIN_REMINDER_DELAY_HOURS, MAX_REMINDER_DELAY_HOURS),
        _ => DEFAULT_REMINDER_DELAY_HOURS,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReminderRequest {
    pub guest_id: Option<String>,
    pub guest_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Clone)]
pub struct ReminderScheduler {
    reminders: Collection<PendingReminder>,
    event: EventSettings,
}

impl ReminderScheduler {
    pub fn new(store: Arc<dyn BlobStore>, event: EventSettings) -> Self {
        Self {
            reminders: Collection::new(store, keys::PENDING_REMINDERS),
            event,
        }
    }

    pub async fn list(&self) -> PotluckResult<Vec<PendingReminder>> {
        Ok(self.reminders.list().await?)
    }

    /// Returns the new reminder and the delay in hours that was applied
    pub async fn schedule(&self, request: ReminderRequest) -> PotluckResult<(PendingReminder, i64)> {
        self.schedule_at(request, Utc::now()).await
    }

    pub async fn schedule_at(
        &self,
        request: ReminderRequest,
        now: DateTime<Utc>,
    ) -> PotluckResult<(PendingReminder, i64)> {
        let field = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let (Some(guest_id), Some(guest_name), Some(phone_number)) = (
            field(request.guest_id),
            field(request.guest_name),
            field(request.phone_number),
        ) else {
            return Err(PotluckError::validation(
                "Missing required fields: guest_id, guest_name, phone_number",
            ));
        };

        let config = self.event.get().await?;
        let delay = effective_delay_hours(config.reminder_delay_hours);

        let reminder = PendingReminder {
            id: Uuid::new_v4().to_string(),
            guest_id,
            guest_name,
            phone_number,
            scheduled_for: now + Duration::hours(delay),
            sent: false,
            sent_at: None,
            delivering_since: None,
            created_at: now,
        };

        let reminder = self.reminders.insert(reminder).await?;
        info!(
            "Reminder {} scheduled for {} at {}",
            reminder.id, reminder.guest_name, reminder.scheduled_for
        );
        Ok((reminder, delay))
    }
}

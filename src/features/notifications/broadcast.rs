//! # Broadcast
//!
//! One free-text message to every guest with a phone number.
//!
//! - **Version**: 1.0.1
//! - **Since**: 1.1.0
//!
//! ## Changelog
//! - 1.0.1: Configuration is checked before the message and recipients
//! - 1.0.0: Initial broadcast

use super::sms::{send_with_timeout, NotificationGateway};
use crate::core::{Guest, PotluckError, PotluckResult};
use log::{info, warn};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BroadcastError {
    pub guest: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BroadcastReport {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub errors: Vec<BroadcastError>,
}

pub async fn broadcast(
    gateway: &dyn NotificationGateway,
    guests: &[Guest],
    message: &str,
    timeout: Duration,
) -> PotluckResult<BroadcastReport> {
    if !gateway.is_configured() {
        return Err(PotluckError::configuration("SMS service not configured"));
    }

    let message = message.trim();
    if message.is_empty() {
        return Err(PotluckError::validation("Message is required"));
    }

    let recipients: Vec<&Guest> = guests
        .iter()
        .filter(|g| !g.phone_number.trim().is_empty())
        .collect();
    if recipients.is_empty() {
        return Err(PotluckError::validation("No guests with phone numbers to message"));
    }

    let mut report = BroadcastReport {
        total: recipients.len(),
        ..Default::default()
    };

    for guest in recipients {
        match send_with_timeout(gateway, &guest.phone_number, message, timeout).await {
            Ok(_) => report.sent += 1,
            Err(e) => {
                warn!("Broadcast to {} ({}) failed: {}", guest.name, guest.phone_number, e);
                report.failed += 1;
                report.errors.push(BroadcastError {
                    guest: guest.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Broadcast finished: {} sent, {} failed of {}",
        report.sent, report.failed, report.total
    );
    Ok(report)
}

//! # Notifications Feature
//!
//! Text messaging: the gateway contract, the Twilio client, and host broadcasts.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: true (requires Twilio credentials)

pub mod broadcast;
pub mod sms;

pub use broadcast::{broadcast, BroadcastError, BroadcastReport};
pub use sms::{send_with_timeout, DeliveryReceipt, GatewayError, NotificationGateway, TwilioGateway};

//! # SMS Gateway
//!
//! Outbound text messages through the Twilio REST API. Missing credentials
//! leave the gateway in place but unconfigured, so callers can report a
//! configuration error instead of a delivery failure.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::core::SmsCredentials;
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("SMS service not configured")]
    NotConfigured,

    #[error("Provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timed out after {0:?}")]
    TimedOut(Duration),
}

/// Provider acknowledgement of an accepted message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryReceipt {
    pub message_id: Option<String>,
}

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn send(&self, to: &str, body: &str) -> Result<DeliveryReceipt, GatewayError>;
}

/// Run one gateway call under a deadline; expiry counts as a failure
pub async fn send_with_timeout(
    gateway: &dyn NotificationGateway,
    to: &str,
    body: &str,
    limit: Duration,
) -> Result<DeliveryReceipt, GatewayError> {
    match tokio::time::timeout(limit, gateway.send(to, body)).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::TimedOut(limit)),
    }
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioError {
    message: Option<String>,
}

pub struct TwilioGateway {
    credentials: Option<SmsCredentials>,
    client: reqwest::Client,
    api_base: String,
}

impl TwilioGateway {
    pub fn new(credentials: Option<SmsCredentials>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            credentials,
            client,
            api_base: TWILIO_API_BASE.to_string(),
        })
    }
}

#[async_trait]
impl NotificationGateway for TwilioGateway {
    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn send(&self, to: &str, body: &str) -> Result<DeliveryReceipt, GatewayError> {
        let credentials = self.credentials.as_ref().ok_or(GatewayError::NotConfigured)?;

        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.api_base, credentials.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(&[
                ("To", to),
                ("From", credentials.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<TwilioError>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| status.to_string());
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let message_id = response.json::<TwilioMessage>().await.ok().and_then(|m| m.sid);
        debug!("SMS accepted for {to} ({message_id:?})");
        Ok(DeliveryReceipt { message_id })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedGateway;
    use super::*;

    #[tokio::test]
    async fn test_twilio_without_credentials_is_not_configured() {
        let gateway = TwilioGateway::new(None, Duration::from_secs(1)).unwrap();
        assert!(!gateway.is_configured());
        assert!(matches!(
            gateway.send("5551234567", "hi").await,
            Err(GatewayError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_send_with_timeout_expires() {
        let gateway = ScriptedGateway {
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        };
        let result = send_with_timeout(&gateway, "5551234567", "hi", Duration::from_millis(20)).await;
        assert!(matches!(result, Err(GatewayError::TimedOut(_))));
        assert!(gateway.sent_to().is_empty());
    }

    #[tokio::test]
    async fn test_send_with_timeout_passes_result_through() {
        let gateway = ScriptedGateway::failing_for(&["5550000000"]);
        assert!(send_with_timeout(&gateway, "5551234567", "hi", Duration::from_secs(1))
            .await
            .is_ok());
        assert!(matches!(
            send_with_timeout(&gateway, "5550000000", "hi", Duration::from_secs(1)).await,
            Err(GatewayError::Rejected { status: 400, .. })
        ));
    }
}

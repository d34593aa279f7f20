//! # Configuration
//!
//! Environment-derived settings. Gateway credentials are optional: leaving them
//! out only disables messaging or suggestions. The reminder sweep reads a
//! smaller subset so a cron host needs no login passwords.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.0: SweepConfig for the standalone sweep, TRUST_PROXY
//! - 1.1.0: Added GATEWAY_TIMEOUT_SECS and EVENT_CONFIG_PATH
//! - 1.0.0: Initial env-based configuration

use anyhow::Result;
use std::time::Duration;

/// Twilio credentials; present only when all three variables are set
#[derive(Debug, Clone, PartialEq)]
pub struct SmsCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

/// Trimmed value, blank counts as unset
fn read<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn read_flag<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    read(lookup, key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// What a reminder sweep needs: the store, the SMS gateway and link text
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub database_path: String,
    pub log_level: String,
    pub app_base_url: String,
    pub sms: Option<SmsCredentials>,
    pub gateway_timeout: Duration,
}

impl SweepConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| read(&lookup, key);

        let sms = match (
            var("TWILIO_ACCOUNT_SID"),
            var("TWILIO_AUTH_TOKEN"),
            var("TWILIO_PHONE_NUMBER"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(SmsCredentials {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => None,
        };

        let gateway_timeout_secs = match var("GATEWAY_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| anyhow::anyhow!("GATEWAY_TIMEOUT_SECS must be a positive integer, got {raw}"))?,
            None => 10,
        };

        Ok(SweepConfig {
            database_path: var("DATABASE_PATH").unwrap_or_else(|| "potluck.db".to_string()),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            app_base_url: var("APP_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            sms,
            gateway_timeout: Duration::from_secs(gateway_timeout_secs),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub database_path: String,
    pub log_level: String,
    pub guest_password: String,
    pub admin_password: String,
    pub cron_secret: Option<String>,
    pub app_base_url: String,
    pub sms: Option<SmsCredentials>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub event_config_path: Option<String>,
    pub gateway_timeout: Duration,
    pub secure_cookies: bool,
    /// Take the login throttle key from `x-forwarded-for`
    pub trust_proxy: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| read(&lookup, key);

        let guest_password = var("GUEST_PASSWORD")
            .ok_or_else(|| anyhow::anyhow!("GUEST_PASSWORD must be set"))?;
        let admin_password = var("ADMIN_PASSWORD")
            .ok_or_else(|| anyhow::anyhow!("ADMIN_PASSWORD must be set"))?;

        let shared = SweepConfig::from_lookup(&lookup)?;

        Ok(Config {
            bind_address: var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            database_path: shared.database_path,
            log_level: shared.log_level,
            guest_password,
            admin_password,
            cron_secret: var("CRON_SECRET"),
            app_base_url: shared.app_base_url,
            sms: shared.sms,
            openai_api_key: var("OPENAI_API_KEY"),
            openai_model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            event_config_path: var("EVENT_CONFIG_PATH"),
            gateway_timeout: shared.gateway_timeout,
            secure_cookies: read_flag(&lookup, "SECURE_COOKIES"),
            trust_proxy: read_flag(&lookup, "TRUST_PROXY"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_passwords() {
        let config = Config::from_lookup(lookup(&[
            ("GUEST_PASSWORD", "pumpkin"),
            ("ADMIN_PASSWORD", "gravy"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.database_path, "potluck.db");
        assert_eq!(config.gateway_timeout, Duration::from_secs(10));
        assert!(config.sms.is_none());
        assert!(config.openai_api_key.is_none());
        assert!(config.cron_secret.is_none());
        assert!(!config.secure_cookies);
        assert!(!config.trust_proxy);
    }

    #[test]
    fn test_missing_password_is_an_error() {
        let err = Config::from_lookup(lookup(&[("GUEST_PASSWORD", "pumpkin")])).unwrap_err();
        assert!(err.to_string().contains("ADMIN_PASSWORD"));
    }

    #[test]
    fn test_partial_twilio_credentials_disable_sms() {
        let config = Config::from_lookup(lookup(&[
            ("GUEST_PASSWORD", "pumpkin"),
            ("ADMIN_PASSWORD", "gravy"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "  "),
            ("TWILIO_PHONE_NUMBER", "+15550001111"),
        ]))
        .unwrap();

        assert!(config.sms.is_none());
    }

    #[test]
    fn test_full_configuration() {
        let config = Config::from_lookup(lookup(&[
            ("GUEST_PASSWORD", "pumpkin"),
            ("ADMIN_PASSWORD", "gravy"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
            ("TWILIO_PHONE_NUMBER", "+15550001111"),
            ("APP_BASE_URL", "https://potluck.example.com/"),
            ("GATEWAY_TIMEOUT_SECS", "5"),
            ("SECURE_COOKIES", "true"),
        ]))
        .unwrap();

        assert_eq!(config.app_base_url, "https://potluck.example.com");
        assert_eq!(config.gateway_timeout, Duration::from_secs(5));
        assert!(config.secure_cookies);
        assert_eq!(
            config.sms,
            Some(SmsCredentials {
                account_sid: "AC123".to_string(),
                auth_token: "secret".to_string(),
                from_number: "+15550001111".to_string(),
            })
        );
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("GUEST_PASSWORD", "pumpkin"),
            ("ADMIN_PASSWORD", "gravy"),
            ("GATEWAY_TIMEOUT_SECS", "0"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_sweep_config_needs_no_passwords() {
        let config = SweepConfig::from_lookup(lookup(&[
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
            ("TWILIO_PHONE_NUMBER", "+15550001111"),
            ("DATABASE_PATH", "/var/lib/potluck/potluck.db"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, "/var/lib/potluck/potluck.db");
        assert_eq!(config.app_base_url, "http://localhost:3000");
        assert!(config.sms.is_some());
        assert_eq!(config.gateway_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_trust_proxy_flag() {
        let config = Config::from_lookup(lookup(&[
            ("GUEST_PASSWORD", "pumpkin"),
            ("ADMIN_PASSWORD", "gravy"),
            ("TRUST_PROXY", "yes"),
        ]))
        .unwrap();

        assert!(config.trust_proxy);
    }
}

//! # Error Taxonomy
//!
//! Expected outcomes (validation, not found, already sent, configuration,
//! delivery) are typed variants; anything else travels as `Internal`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PotluckError {
    /// Missing or malformed input, never retried automatically
    #[error("{0}")]
    Validation(String),

    /// Referenced guest, dish, or reminder does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Single-item send attempted on a reminder that was already delivered
    #[error("Reminder already sent")]
    AlreadySent,

    /// A required external credential is absent
    #[error("{0}")]
    Configuration(String),

    /// The notification gateway failed or rejected one message
    #[error("Failed to deliver message: {0}")]
    Delivery(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Too many failed attempts, try again later")]
    RateLimited,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PotluckError {
    pub fn validation(message: impl Into<String>) -> Self {
        PotluckError::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        PotluckError::Configuration(message.into())
    }
}

pub type PotluckResult<T> = std::result::Result<T, PotluckError>;

//! # Core Module
//!
//! Domain records, configuration, and error taxonomy shared by every feature.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod config;
pub mod error;
pub mod models;

pub use config::{Config, SmsCredentials, SweepConfig};
pub use error::{PotluckError, PotluckResult};
pub use models::{
    CookingSkill, Dish, DishCategory, DishStatus, EventConfig, Guest, PendingReminder,
    RecipeSuggestion, HOST_PLACEHOLDER_ID,
};

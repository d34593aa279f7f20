//! # Event Settings
//!
//! The singleton event configuration. Nothing is stored until the host first
//! saves; until then reads fall back to the seed, which is the hardcoded
//! default optionally overlaid with a YAML file.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: YAML seed file and delay validation on save
//! - 1.0.0: Initial singleton record

use crate::core::{DishCategory, EventConfig, PotluckError, PotluckResult};
use crate::database::{keys, BlobStore, Document};
use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Bounds a host may set for the reminder delay
pub const MIN_REMINDER_DELAY_HOURS: i64 = 1;
pub const MAX_REMINDER_DELAY_HOURS: i64 = 168;

/// Partial event configuration read from YAML; omitted fields keep the default
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventSeed {
    pub date: Option<String>,
    pub location: Option<String>,
    pub target_guest_count: Option<u32>,
    pub category_targets: Option<BTreeMap<DishCategory, u32>>,
    pub reminder_delay_hours: Option<i64>,
}

impl EventSeed {
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event config {path}"))?;
        let seed: EventSeed = serde_yaml::from_str(&contents)
            .with_context(|| format!("Invalid event config {path}"))?;
        Ok(seed)
    }

    pub fn apply(self, mut config: EventConfig) -> EventConfig {
        if let Some(date) = self.date {
            config.date = date;
        }
        if let Some(location) = self.location {
            config.location = location;
        }
        if let Some(count) = self.target_guest_count {
            config.target_guest_count = count;
        }
        if let Some(targets) = self.category_targets {
            config.category_targets = targets;
        }
        if self.reminder_delay_hours.is_some() {
            config.reminder_delay_hours = self.reminder_delay_hours;
        }
        config
    }
}

/// Reject a configuration the host should not be able to save
pub fn validate(config: &EventConfig) -> PotluckResult<()> {
    if config.location.trim().is_empty() {
        return Err(PotluckError::validation("Location cannot be blank"));
    }

    if let Some(delay) = config.reminder_delay_hours {
        if !(MIN_REMINDER_DELAY_HOURS..=MAX_REMINDER_DELAY_HOURS).contains(&delay) {
            return Err(PotluckError::Validation(format!(
                "Reminder delay must be between {MIN_REMINDER_DELAY_HOURS} and {MAX_REMINDER_DELAY_HOURS} hours"
            )));
        }
    }

    Ok(())
}

#[derive(Clone)]
pub struct EventSettings {
    document: Document<EventConfig>,
    seed: Option<EventSeed>,
}

impl EventSettings {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            document: Document::new(store, keys::EVENT_CONFIG),
            seed: None,
        }
    }

    /// Use `seed` instead of the bare hardcoded default for first reads
    pub fn with_seed(mut self, seed: EventSeed) -> Self {
        self.seed = Some(seed);
        self
    }

    fn default_config(&self) -> EventConfig {
        match &self.seed {
            Some(seed) => seed.clone().apply(EventConfig::default()),
            None => EventConfig::default(),
        }
    }

    pub async fn get(&self) -> PotluckResult<EventConfig> {
        Ok(self.document.load_or(|| self.default_config()).await?)
    }

    pub async fn save(&self, config: EventConfig) -> PotluckResult<EventConfig> {
        validate(&config)?;
        self.document.save(&config).await?;
        info!(
            "Event updated: {} at {} for {} guests",
            config.date, config.location, config.target_guest_count
        );
        Ok(config)
    }
}

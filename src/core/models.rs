//! # Domain Model
//!
//! Records persisted in the Data Store: guests, dishes, the singleton event
//! configuration, and pending reminders.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Added `sent_at` to reminders and `serves` to dishes
//! - 1.0.0: Initial domain records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Owner id used for dishes the host has requested but nobody has claimed yet
pub const HOST_PLACEHOLDER_ID: &str = "host";

/// Self-reported cooking skill of a guest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookingSkill {
    Beginner,
    Intermediate,
    Advanced,
}

impl CookingSkill {
    pub fn as_str(&self) -> &'static str {
        match self {
            CookingSkill::Beginner => "beginner",
            CookingSkill::Intermediate => "intermediate",
            CookingSkill::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for CookingSkill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dish category. Declaration order is the display order of the balance report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DishCategory {
    Appetizer,
    Main,
    Side,
    Dessert,
    Beverage,
}

impl DishCategory {
    pub const ALL: [DishCategory; 5] = [
        DishCategory::Appetizer,
        DishCategory::Main,
        DishCategory::Side,
        DishCategory::Dessert,
        DishCategory::Beverage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DishCategory::Appetizer => "appetizer",
            DishCategory::Main => "main",
            DishCategory::Side => "side",
            DishCategory::Dessert => "dessert",
            DishCategory::Beverage => "beverage",
        }
    }
}

impl std::fmt::Display for DishCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a dish: `requested` dishes have no committed owner yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DishStatus {
    Requested,
    Claimed,
    Preparing,
    Confirmed,
}

impl DishStatus {
    /// Whether someone has committed to bringing the dish
    pub fn is_committed(&self) -> bool {
        !matches!(self, DishStatus::Requested)
    }
}

impl Default for DishStatus {
    fn default() -> Self {
        DishStatus::Claimed
    }
}

/// A guest who has RSVP'd
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    /// Contact used by older records before phone numbers were collected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub cooking_skill: CookingSkill,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub dish_claimed: bool,
    #[serde(default)]
    pub bringing_partner: bool,
    pub created_at: DateTime<Utc>,
}

/// A dish someone is bringing, or one the host/a guest has asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: String,
    pub guest_id: String,
    pub guest_name: String,
    pub category: DishCategory,
    pub dish_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serves: Option<u32>,
    #[serde(default)]
    pub status: DishStatus,
    /// Serialized `RecipeSuggestion` when the dish came from a suggestion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Singleton event configuration managed by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    pub date: String,
    pub location: String,
    pub target_guest_count: u32,
    pub category_targets: BTreeMap<DishCategory, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_delay_hours: Option<i64>,
}

impl Default for EventConfig {
    fn default() -> Self {
        let category_targets = BTreeMap::from([
            (DishCategory::Appetizer, 3),
            (DishCategory::Main, 2),
            (DishCategory::Side, 4),
            (DishCategory::Dessert, 3),
            (DishCategory::Beverage, 2),
        ]);

        EventConfig {
            date: Utc::now().to_rfc3339(),
            location: "TBD".to_string(),
            target_guest_count: 20,
            category_targets,
            reminder_delay_hours: Some(24),
        }
    }
}

/// A one-time text reminder for a guest who deferred picking a dish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReminder {
    pub id: String,
    pub guest_id: String,
    pub guest_name: String,
    pub phone_number: String,
    pub scheduled_for: DateTime<Utc>,
    #[serde(default)]
    pub sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    /// Set before the gateway is called, cleared once the outcome is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivering_since: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PendingReminder {
    /// Due and not yet sent
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.sent && self.scheduled_for <= now
    }

    /// A delivery attempt started but its outcome was never recorded
    pub fn is_in_doubt(&self) -> bool {
        !self.sent && self.delivering_since.is_some()
    }
}

/// Structured recipe idea returned by the suggestion gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSuggestion {
    pub category: DishCategory,
    pub recipe_name: String,
    pub difficulty: CookingSkill,
    pub serves: u32,
    pub reasoning: String,
    #[serde(default)]
    pub ingredients_summary: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_targets_round_trip_as_lowercase_keys() {
        let config = EventConfig::default();
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["category_targets"]["side"], 4);
        assert_eq!(json["category_targets"]["beverage"], 2);

        let parsed: EventConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.category_targets, config.category_targets);
    }

    #[test]
    fn test_legacy_guest_with_email_only() {
        let guest: Guest = serde_json::from_str(
            r#"{
                "id": "g1",
                "name": "Ada",
                "email": "ada@example.com",
                "cooking_skill": "advanced",
                "dietary_restrictions": ["vegan"],
                "dish_claimed": false,
                "created_at": "2024-11-01T12:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(guest.phone_number, "");
        assert_eq!(guest.email.as_deref(), Some("ada@example.com"));
        assert!(!guest.bringing_partner);
    }

    #[test]
    fn test_dish_status_defaults_to_claimed() {
        let dish: Dish = serde_json::from_str(
            r#"{
                "id": "d1",
                "guest_id": "g1",
                "guest_name": "Ada",
                "category": "main",
                "dish_name": "Lasagna",
                "created_at": "2024-11-01T12:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(dish.status, DishStatus::Claimed);
        assert!(dish.status.is_committed());
        assert!(!DishStatus::Requested.is_committed());
    }

    #[test]
    fn test_reminder_is_due() {
        let now = Utc::now();
        let mut reminder = PendingReminder {
            id: "r1".to_string(),
            guest_id: "g1".to_string(),
            guest_name: "Ada".to_string(),
            phone_number: "5551234567".to_string(),
            scheduled_for: now,
            sent: false,
            sent_at: None,
            delivering_since: None,
            created_at: now,
        };

        assert!(reminder.is_due(now));
        assert!(!reminder.is_in_doubt());
        assert!(!reminder.is_due(now - chrono::Duration::seconds(1)));

        reminder.delivering_since = Some(now);
        assert!(reminder.is_in_doubt());

        reminder.sent = true;
        assert!(!reminder.is_due(now));
        assert!(!reminder.is_in_doubt());
    }
}

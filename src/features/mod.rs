//! # Features
//!
//! Every feature module plus a static registry of their versions, reported by
//! the health endpoint.

pub mod auth;
pub mod balance;
pub mod dishes;
pub mod event;
pub mod guests;
pub mod notifications;
pub mod reminders;
pub mod suggestions;

pub use auth::{Authenticator, LoginThrottle, Role, SessionStore};
pub use balance::{calculate_balance, total_servings, CategoryBalance};
pub use dishes::{ClaimRequest, DishBoard, DishUpdate, HostRequest, NewDish};
pub use event::{EventSeed, EventSettings};
pub use guests::{GuestBook, GuestUpdate, NewGuest};
pub use notifications::{broadcast, BroadcastReport, NotificationGateway, TwilioGateway};
pub use reminders::{ReminderDispatcher, ReminderRequest, ReminderScheduler, SendOutcome, SweepReport};
pub use suggestions::{OpenAiGateway, RecipeAdvisor, SuggestionGateway, SuggestionRequest};

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FeatureInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    pub since: &'static str,
    pub toggleable: bool,
}

pub fn get_features() -> Vec<FeatureInfo> {
    vec![
        FeatureInfo { id: "auth", name: "Authentication", version: "1.1.0", since: "1.0.0", toggleable: false },
        FeatureInfo { id: "guests", name: "Guests", version: "1.1.0", since: "1.0.0", toggleable: false },
        FeatureInfo { id: "dishes", name: "Dishes", version: "1.2.0", since: "1.0.0", toggleable: false },
        FeatureInfo { id: "event", name: "Event", version: "1.1.0", since: "1.0.0", toggleable: false },
        FeatureInfo { id: "balance", name: "Balance", version: "1.1.0", since: "1.0.0", toggleable: false },
        FeatureInfo { id: "reminders", name: "Reminders", version: "1.2.0", since: "1.0.0", toggleable: true },
        FeatureInfo { id: "notifications", name: "Notifications", version: "1.0.0", since: "1.0.0", toggleable: true },
        FeatureInfo { id: "suggestions", name: "Suggestions", version: "1.1.0", since: "1.0.0", toggleable: true },
    ]
}

pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_feature_ids_are_unique() {
        let features = get_features();
        let ids: HashSet<_> = features.iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), features.len());
    }

    #[test]
    fn test_version_matches_package() {
        assert_eq!(get_version(), "1.0.0");
    }
}

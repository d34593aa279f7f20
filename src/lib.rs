// Core layer - shared types, configuration, errors
pub mod core;

// Features layer - all feature modules
pub mod features;

// Infrastructure
pub mod database;

// Application layer - HTTP routes
pub mod api;

pub use crate::core::{Config, PotluckError, PotluckResult, SweepConfig};
pub use database::{BlobStore, Database};

pub use api::{build_router, AppContext};

pub use features::{
    // Auth
    Authenticator, Role,
    // Balance
    calculate_balance, CategoryBalance,
    // Dishes and guests
    DishBoard, GuestBook,
    // Event
    EventSeed, EventSettings,
    // Notifications
    NotificationGateway, TwilioGateway,
    // Reminders
    ReminderDispatcher, ReminderScheduler, SweepReport,
    // Suggestions
    OpenAiGateway, RecipeAdvisor, SuggestionGateway,
};

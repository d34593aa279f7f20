//! Shared state for HTTP handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::core::Config;
use crate::database::BlobStore;
use crate::features::{
    Authenticator, DishBoard, EventSeed, EventSettings, GuestBook, NotificationGateway, RecipeAdvisor,
    ReminderDispatcher, ReminderScheduler, SuggestionGateway,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Services every handler can reach. Cheap to clone; all state lives behind
/// the store or in `Arc`s.
#[derive(Clone)]
pub struct AppContext {
    pub guests: GuestBook,
    pub dishes: DishBoard,
    pub event: EventSettings,
    pub scheduler: ReminderScheduler,
    pub dispatcher: ReminderDispatcher,
    pub advisor: RecipeAdvisor,
    pub sms: Arc<dyn NotificationGateway>,
    pub auth: Authenticator,
    pub cron_secret: Option<String>,
    pub secure_cookies: bool,
    pub trust_proxy: bool,
    pub gateway_timeout: Duration,
    pub start_time: Instant,
}

impl AppContext {
    pub fn new(
        config: &Config,
        store: Arc<dyn BlobStore>,
        sms: Arc<dyn NotificationGateway>,
        suggestions: Arc<dyn SuggestionGateway>,
        seed: Option<EventSeed>,
    ) -> Self {
        Self::with_auth(
            config,
            store,
            sms,
            suggestions,
            seed,
            Authenticator::new(&config.guest_password, &config.admin_password),
        )
    }

    pub fn with_auth(
        config: &Config,
        store: Arc<dyn BlobStore>,
        sms: Arc<dyn NotificationGateway>,
        suggestions: Arc<dyn SuggestionGateway>,
        seed: Option<EventSeed>,
        auth: Authenticator,
    ) -> Self {
        let mut event = EventSettings::new(store.clone());
        if let Some(seed) = seed {
            event = event.with_seed(seed);
        }

        let guests = GuestBook::new(store.clone());
        let dishes = DishBoard::new(store.clone(), guests.clone());
        let scheduler = ReminderScheduler::new(store.clone(), event.clone());
        let dispatcher = ReminderDispatcher::new(
            store,
            sms.clone(),
            &config.app_base_url,
            config.gateway_timeout,
        );
        let advisor = RecipeAdvisor::new(suggestions, dishes.clone(), event.clone());

        Self {
            guests,
            dishes,
            event,
            scheduler,
            dispatcher,
            advisor,
            sms,
            auth,
            cron_secret: config.cron_secret.clone(),
            secure_cookies: config.secure_cookies,
            trust_proxy: config.trust_proxy,
            gateway_timeout: config.gateway_timeout,
            start_time: Instant::now(),
        }
    }
}

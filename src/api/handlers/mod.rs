//! Route handlers grouped by area.

pub mod auth;
pub mod dishes;
pub mod event;
pub mod guests;
pub mod reminders;

use super::context::AppContext;
use crate::features::{get_features, get_version};
use axum::extract::State;
use axum::Json;
use serde_json::json;

pub async fn health(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": get_version(),
        "uptime_secs": ctx.start_time.elapsed().as_secs(),
        "messaging_enabled": ctx.sms.is_configured(),
        "suggestions_enabled": ctx.advisor.is_enabled(),
        "features": get_features(),
    }))
}

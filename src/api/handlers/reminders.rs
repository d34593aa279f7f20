//! Reminder routes: "claim later", listing, sweep, manual send

use crate::api::context::AppContext;
use crate::api::error::{ApiJson, ApiResult};
use crate::api::middleware::{has_cron_secret, session_role};
use crate::core::{PendingReminder, PotluckError};
use crate::features::{ReminderRequest, Role};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use log::warn;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize)]
struct ScheduledReminder {
    #[serde(flatten)]
    reminder: PendingReminder,
    message: String,
}

pub async fn schedule(
    State(ctx): State<AppContext>,
    ApiJson(request): ApiJson<ReminderRequest>,
) -> ApiResult<impl IntoResponse> {
    let (reminder, delay) = ctx.scheduler.schedule(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ScheduledReminder {
            reminder,
            message: format!("Reminder scheduled for {delay} hours from now"),
        }),
    ))
}

/// Admin only; shares its path with the guest-facing POST
pub async fn list(State(ctx): State<AppContext>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    if session_role(&ctx, &headers) != Some(Role::Admin) {
        return Err(PotluckError::Unauthorized);
    }
    Ok(Json(ctx.scheduler.list().await?))
}

/// Batch sweep, called by the external timer with the cron secret or by an admin
pub async fn sweep(State(ctx): State<AppContext>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    let is_admin = session_role(&ctx, &headers) == Some(Role::Admin);
    if !is_admin && !has_cron_secret(&ctx, &headers) {
        return Err(PotluckError::Unauthorized);
    }

    let report = ctx.dispatcher.sweep().await?;
    Ok(Json(json!({
        "success": true,
        "processed": report.processed,
        "sent": report.sent,
        "failed": report.failed,
        "unrecorded": report.unrecorded,
    })))
}

pub async fn send_one(State(ctx): State<AppContext>, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    let outcome = ctx.dispatcher.send_now(&id).await?;

    if outcome.is_recorded() {
        Ok(Json(json!({
            "success": true,
            "recorded": true,
            "message": "Reminder sent successfully",
        })))
    } else {
        warn!("Reminder {id} was delivered but is not yet marked sent");
        Ok(Json(json!({
            "success": true,
            "recorded": false,
            "message": "Reminder sent successfully",
            "warning": "Message was delivered but could not be marked as sent",
        })))
    }
}

//! Dashboard, event settings, suggestions, broadcast

use crate::api::context::AppContext;
use crate::api::error::{ApiJson, ApiResult};
use crate::core::EventConfig;
use crate::features::{broadcast as send_broadcast, calculate_balance, total_servings, SuggestionRequest};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

pub async fn dashboard(State(ctx): State<AppContext>) -> ApiResult<impl IntoResponse> {
    let (guests, dishes, event) = tokio::try_join!(ctx.guests.list(), ctx.dishes.list(), ctx.event.get())?;

    let balance = calculate_balance(&dishes, &event.category_targets);
    let servings = total_servings(&dishes);

    Ok(Json(json!({
        "guests": guests,
        "dishes": dishes,
        "event": event,
        "balance": balance,
        "total_servings": servings,
    })))
}

pub async fn get_event(State(ctx): State<AppContext>) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.event.get().await?))
}

pub async fn put_event(
    State(ctx): State<AppContext>,
    ApiJson(config): ApiJson<EventConfig>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.event.save(config).await?))
}

pub async fn suggest(
    State(ctx): State<AppContext>,
    ApiJson(request): ApiJson<SuggestionRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.advisor.suggest(request).await?))
}

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    pub message: Option<String>,
}

pub async fn broadcast(
    State(ctx): State<AppContext>,
    ApiJson(request): ApiJson<BroadcastRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = request.message.unwrap_or_default();

    let guests = ctx.guests.list().await?;
    let report = send_broadcast(ctx.sms.as_ref(), &guests, &message, ctx.gateway_timeout).await?;
    Ok(Json(report))
}

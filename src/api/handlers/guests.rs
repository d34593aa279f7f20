//! RSVP routes, guest-facing and admin

use crate::api::context::AppContext;
use crate::api::error::{ApiJson, ApiResult};
use crate::features::{GuestUpdate, NewGuest};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct GuestQuery {
    pub phone: Option<String>,
}

/// All guests, or the one RSVP matching `?phone=`
pub async fn list(State(ctx): State<AppContext>, Query(query): Query<GuestQuery>) -> ApiResult<Response> {
    match query.phone {
        Some(phone) => Ok(Json(ctx.guests.find_by_phone(&phone).await?).into_response()),
        None => Ok(Json(ctx.guests.list().await?).into_response()),
    }
}

pub async fn create(
    State(ctx): State<AppContext>,
    ApiJson(request): ApiJson<NewGuest>,
) -> ApiResult<impl IntoResponse> {
    let guest = ctx.guests.create(request).await?;
    Ok((StatusCode::CREATED, Json(guest)))
}

pub async fn update(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<GuestUpdate>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.guests.update(&id, update).await?))
}

pub async fn delete(State(ctx): State<AppContext>, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    ctx.guests.delete(&id).await?;
    Ok(Json(json!({ "success": true })))
}

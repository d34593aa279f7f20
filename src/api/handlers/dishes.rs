//! Dish routes, guest-facing and admin

use crate::api::context::AppContext;
use crate::api::error::{ApiJson, ApiResult};
use crate::features::{ClaimRequest, DishUpdate, HostRequest, NewDish};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn list(State(ctx): State<AppContext>) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.dishes.list().await?))
}

pub async fn create(
    State(ctx): State<AppContext>,
    ApiJson(request): ApiJson<NewDish>,
) -> ApiResult<impl IntoResponse> {
    let dish = ctx.dishes.create(request).await?;
    Ok((StatusCode::CREATED, Json(dish)))
}

pub async fn claim(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ClaimRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.dishes.claim(&id, request).await?))
}

pub async fn request_as_host(
    State(ctx): State<AppContext>,
    ApiJson(request): ApiJson<HostRequest>,
) -> ApiResult<impl IntoResponse> {
    let dish = ctx.dishes.request_as_host(request).await?;
    Ok((StatusCode::CREATED, Json(dish)))
}

pub async fn update(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<DishUpdate>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.dishes.update(&id, update).await?))
}

pub async fn delete(State(ctx): State<AppContext>, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    ctx.dishes.delete(&id).await?;
    Ok(Json(json!({ "success": true })))
}

//! Login and logout

use crate::api::context::AppContext;
use crate::api::error::{ApiJson, ApiResult};
use crate::api::middleware::cookie_header;
use crate::core::PotluckError;
use crate::features::auth::cookies::{expired_cookie, session_cookie};
use crate::features::Role;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: Option<String>,
    #[serde(rename = "type")]
    pub role: Option<Role>,
}

/// Throttle key: the peer address, or the first forwarded address when the
/// server is configured to sit behind a trusted proxy
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let forwarded = || {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    trust_proxy
        .then(forwarded)
        .flatten()
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn login(
    State(ctx): State<AppContext>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(password), Some(role)) = (request.password.filter(|p| !p.is_empty()), request.role) else {
        return Err(PotluckError::validation("Missing password or type"));
    };

    let client = client_key(&headers, peer.map(|ConnectInfo(addr)| addr), ctx.trust_proxy);
    let session = ctx.auth.login(role, &password, &client)?;

    let cookie = session_cookie(
        role.cookie_name(),
        &session,
        ctx.auth.sessions().ttl(),
        ctx.secure_cookies,
    );

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(json!({ "success": true, "type": role })),
    ))
}

pub async fn logout(State(ctx): State<AppContext>, headers: HeaderMap) -> impl IntoResponse {
    ctx.auth.logout(&cookie_header(&headers));

    (
        AppendHeaders([
            (header::SET_COOKIE, expired_cookie(Role::Guest.cookie_name(), ctx.secure_cookies)),
            (header::SET_COOKIE, expired_cookie(Role::Admin.cookie_name(), ctx.secure_cookies)),
        ]),
        Json(json!({ "success": true })),
    )
}

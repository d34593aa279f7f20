//! Role gates applied with `middleware::from_fn_with_state`.

use super::context::AppContext;
use crate::core::PotluckError;
use crate::features::Role;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

/// All `Cookie` headers joined into one string
pub fn cookie_header(headers: &HeaderMap) -> String {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn session_role(ctx: &AppContext, headers: &HeaderMap) -> Option<Role> {
    ctx.auth.role_from_cookies(&cookie_header(headers))
}

fn authorize(ctx: &AppContext, headers: &HeaderMap, required: Role) -> Result<(), PotluckError> {
    match session_role(ctx, headers) {
        Some(role) if role.satisfies(required) => Ok(()),
        _ => Err(PotluckError::Unauthorized),
    }
}

pub async fn require_guest(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, PotluckError> {
    authorize(&ctx, request.headers(), Role::Guest)?;
    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, PotluckError> {
    authorize(&ctx, request.headers(), Role::Admin)?;
    Ok(next.run(request).await)
}

/// Bearer token matching the configured cron secret
pub fn has_cron_secret(ctx: &AppContext, headers: &HeaderMap) -> bool {
    let Some(secret) = ctx.cron_secret.as_deref() else {
        return false;
    };

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == secret)
        .unwrap_or(false)
}

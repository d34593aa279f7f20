//! # HTTP API
//!
//! JSON routes over the feature services. Guest routes accept guest or admin
//! sessions, admin routes need an admin session, and the batch sweep also
//! accepts the cron bearer secret.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Path-based admin routes, claim endpoint, broadcast
//! - 1.0.0: Initial routes

pub mod context;
pub mod error;
pub mod handlers;
pub mod middleware;

pub use context::AppContext;
pub use error::{ApiJson, ApiResult};

use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};
use axum::Router;
use handlers::{auth, dishes, event, guests, reminders};

pub fn build_router(ctx: AppContext) -> Router {
    let guest_routes = Router::new()
        .route("/api/guests", get(guests::list).post(guests::create))
        .route("/api/dishes", get(dishes::list).post(dishes::create))
        .route("/api/dishes/:id/claim", post(dishes::claim))
        .route("/api/dashboard", get(event::dashboard))
        .route("/api/suggest-recipes", post(event::suggest))
        .route("/api/reminders", post(reminders::schedule).get(reminders::list))
        .layer(from_fn_with_state(ctx.clone(), middleware::require_guest));

    let admin_routes = Router::new()
        .route("/api/reminders/:id/send", post(reminders::send_one))
        .route("/api/admin/guests/:id", patch(guests::update).delete(guests::delete))
        .route("/api/admin/dishes", post(dishes::request_as_host))
        .route("/api/admin/dishes/:id", patch(dishes::update).delete(dishes::delete))
        .route("/api/admin/event", get(event::get_event).put(event::put_event))
        .route("/api/admin/broadcast", post(event::broadcast))
        .layer(from_fn_with_state(ctx.clone(), middleware::require_admin));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/reminders/send", post(reminders::sweep))
        .merge(guest_routes)
        .merge(admin_routes)
        .with_state(ctx)
}

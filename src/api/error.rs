//! HTTP mapping of `PotluckError` and a JSON extractor that reports bad bodies
//! in the same `{"error": ...}` shape.

use crate::core::PotluckError;
use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;

pub type ApiResult<T> = Result<T, PotluckError>;

impl PotluckError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PotluckError::Validation(_) | PotluckError::AlreadySent => StatusCode::BAD_REQUEST,
            PotluckError::Unauthorized => StatusCode::UNAUTHORIZED,
            PotluckError::NotFound(_) => StatusCode::NOT_FOUND,
            PotluckError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            PotluckError::Configuration(_) | PotluckError::Delivery(_) | PotluckError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PotluckError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            PotluckError::Delivery(details) => json!({
                "error": "Failed to deliver message",
                "details": details,
            }),
            PotluckError::Internal(e) => {
                error!("Request failed: {e:#}");
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// `Json<T>` whose rejection is a validation error
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = PotluckError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(PotluckError::Validation(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PotluckError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PotluckError::AlreadySent.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PotluckError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(PotluckError::NotFound("Dish").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(PotluckError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            PotluckError::configuration("SMS service not configured").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PotluckError::Delivery("timeout".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

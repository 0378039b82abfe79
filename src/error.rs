//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::pricing::PricingError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Pricing(e) => match e {
                PricingError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                PricingError::BookingBlocked { .. } => (StatusCode::CONFLICT, e.to_string()),
                PricingError::ReferenceData(msg) => {
                    tracing::error!("Reference data unavailable: {}", msg);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Pricing configuration unavailable".to_string(),
                    )
                }
            },
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_pricing_errors_map_to_client_statuses() {
        let validation = AppError::from(PricingError::Validation("missing date".into()));
        assert_eq!(validation.into_response().status(), StatusCode::BAD_REQUEST);

        let blocked = AppError::from(PricingError::BookingBlocked {
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            city: "Amsterdam".into(),
        });
        assert_eq!(blocked.into_response().status(), StatusCode::CONFLICT);

        let reference = AppError::from(PricingError::ReferenceData("no cities".into()));
        assert_eq!(
            reference.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AppError::Internal("pool exhausted".into());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

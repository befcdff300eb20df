use application::usecases::errors::BookingError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Booking(booking) => match booking {
                BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
                BookingError::Validation(_) => StatusCode::BAD_REQUEST,
                BookingError::CapacityExceeded { .. }
                | BookingError::InvalidStateTransition(_)
                | BookingError::Conflict { .. } => StatusCode::CONFLICT,
                BookingError::PlanUnavailable(_) | BookingError::ReservationNotBookable(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
                BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Don't leak internal error detail to client
            error!(error = ?self, "http: internal error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::value_objects::transitions::InvalidTransition;

    #[test]
    fn booking_errors_map_to_distinct_statuses() {
        let cases = [
            (BookingError::not_found("reservation", "x"), StatusCode::NOT_FOUND),
            (BookingError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                BookingError::CapacityExceeded {
                    committed: 2,
                    requested: 1,
                    maximum: 2,
                },
                StatusCode::CONFLICT,
            ),
            (
                BookingError::PlanUnavailable("inactive".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                BookingError::InvalidStateTransition(InvalidTransition::new(
                    "CONFIRMED",
                    "complete",
                    "only in-progress reservations can be completed",
                )),
                StatusCode::CONFLICT,
            ),
            (BookingError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (
                BookingError::ReservationNotBookable("reservation is cancelled".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                BookingError::Internal(anyhow::anyhow!("connection refused")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (booking, expected) in cases {
            assert_eq!(AppError::from(booking).status_code(), expected);
        }
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let response =
            AppError::from(BookingError::Internal(anyhow::anyhow!("password=hunter2"))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

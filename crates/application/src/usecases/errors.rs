use domain::value_objects::{admission::AdmissionRejection, transitions::InvalidTransition};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(
        "capacity exceeded: {requested} requested, {committed} of {maximum} already committed"
    )]
    CapacityExceeded {
        committed: i64,
        requested: i64,
        maximum: i64,
    },
    #[error("plan unavailable: {0}")]
    PlanUnavailable(String),
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(#[from] InvalidTransition),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("reservation is not bookable: {0}")]
    ReservationNotBookable(String),
    #[error("concurrent modification of {entity} {id}; retry the operation")]
    Conflict { entity: &'static str, id: String },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BookingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        BookingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(entity: &'static str, id: impl ToString) -> Self {
        BookingError::Conflict {
            entity,
            id: id.to_string(),
        }
    }

    /// Picks the error a caller sees for a rejected admission. Plan
    /// availability outranks date validation, which outranks capacity.
    pub fn from_rejections(rejections: &[AdmissionRejection]) -> Self {
        let inactive = rejections
            .iter()
            .find(|r| matches!(r, AdmissionRejection::PlanInactive { .. }));
        let past_date = rejections
            .iter()
            .find(|r| matches!(r, AdmissionRejection::DateNotInFuture { .. }));
        let capacity = rejections
            .iter()
            .find(|r| matches!(r, AdmissionRejection::CapacityExceeded { .. }));

        match (inactive, past_date, capacity) {
            (Some(AdmissionRejection::PlanInactive { status }), _, _) => {
                BookingError::PlanUnavailable(format!("plan is {status}"))
            }
            (_, Some(AdmissionRejection::DateNotInFuture { start_date, today }), _) => {
                BookingError::Validation(format!(
                    "start date {start_date} must be after {today}"
                ))
            }
            (
                _,
                _,
                Some(AdmissionRejection::CapacityExceeded {
                    committed,
                    requested,
                    maximum,
                }),
            ) => BookingError::CapacityExceeded {
                committed: *committed,
                requested: *requested,
                maximum: *maximum,
            },
            _ => BookingError::Validation("booking request was not admitted".to_string()),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BookingError>;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{
    entities::{plans::PlanEntity, reservations::ReservationEntity},
    value_objects::enums::plan_statuses::PlanStatus,
};

/// One independent reason a booking request cannot be admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AdmissionRejection {
    PlanInactive {
        status: PlanStatus,
    },
    DateNotInFuture {
        start_date: NaiveDate,
        today: NaiveDate,
    },
    CapacityExceeded {
        committed: i64,
        requested: i64,
        maximum: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allowed { committed: i64, remaining: i64 },
    Rejected(Vec<AdmissionRejection>),
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

/// Decides whether `requested` more people fit into `plan` on `start_date`,
/// given the people already committed for that date.
///
/// Every failed condition is reported; none short-circuits another.
pub fn evaluate_admission(
    plan: &PlanEntity,
    committed: i64,
    start_date: NaiveDate,
    requested: i64,
    booked_at: DateTime<Utc>,
) -> Admission {
    let mut rejections = Vec::new();

    if plan.status != PlanStatus::Active {
        rejections.push(AdmissionRejection::PlanInactive {
            status: plan.status,
        });
    }

    let today = booked_at.date_naive();
    if start_date <= today {
        rejections.push(AdmissionRejection::DateNotInFuture { start_date, today });
    }

    let maximum = i64::from(plan.maximum_capacity);
    if committed.saturating_add(requested) > maximum {
        rejections.push(AdmissionRejection::CapacityExceeded {
            committed,
            requested,
            maximum,
        });
    }

    if rejections.is_empty() {
        Admission::Allowed {
            committed,
            remaining: maximum - committed - requested,
        }
    } else {
        Admission::Rejected(rejections)
    }
}

/// Result of the storage layer's atomic check-then-insert of a reservation.
#[derive(Debug, Clone)]
pub enum AdmissionOutcome {
    Admitted(ReservationEntity),
    PlanNotFound,
    Rejected(Vec<AdmissionRejection>),
}

/// Seats left for a plan on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub maximum: i64,
    pub committed: i64,
    pub remaining: i64,
}

impl Availability {
    pub fn new(maximum: i64, committed: i64) -> Self {
        Self {
            maximum,
            committed,
            remaining: (maximum - committed).max(0),
        }
    }
}

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    schema::reservations,
    value_objects::enums::{payment_methods::PaymentMethod, reservation_statuses::ReservationStatus},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationEntity {
    pub id: Uuid,
    pub code: String,
    pub plan_id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_people: i32,
    pub gross_amount_minor: i64,
    pub discount_amount_minor: i64,
    pub net_amount_minor: i64,
    pub status: ReservationStatus,
    pub payment_method: PaymentMethod,
    pub observations: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = reservations)]
pub struct ReservationRow {
    pub id: Uuid,
    pub code: String,
    pub plan_id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_people: i32,
    pub gross_amount_minor: i64,
    pub discount_amount_minor: i64,
    pub net_amount_minor: i64,
    pub status: String,
    pub payment_method: String,
    pub observations: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for ReservationEntity {
    type Error = anyhow::Error;

    fn try_from(row: ReservationRow) -> Result<Self> {
        let status = ReservationStatus::from_str(&row.status)
            .ok_or_else(|| anyhow!("reservation {} has unknown status {:?}", row.id, row.status))?;
        let payment_method = PaymentMethod::from_str(&row.payment_method).ok_or_else(|| {
            anyhow!(
                "reservation {} has unknown payment method {:?}",
                row.id,
                row.payment_method
            )
        })?;

        Ok(Self {
            id: row.id,
            code: row.code,
            plan_id: row.plan_id,
            user_id: row.user_id,
            start_date: row.start_date,
            end_date: row.end_date,
            number_of_people: row.number_of_people,
            gross_amount_minor: row.gross_amount_minor,
            discount_amount_minor: row.discount_amount_minor,
            net_amount_minor: row.net_amount_minor,
            status,
            payment_method,
            observations: row.observations,
            emergency_contact: row.emergency_contact,
            emergency_phone: row.emergency_phone,
            cancellation_reason: row.cancellation_reason,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
            cancelled_at: row.cancelled_at,
            updated_at: row.updated_at,
        })
    }
}

/// A reservation ready to be inserted. Built by the application layer after
/// validation; the store still re-checks admission before writing it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservationEntity {
    pub id: Uuid,
    pub code: String,
    pub plan_id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_people: i32,
    pub gross_amount_minor: i64,
    pub discount_amount_minor: i64,
    pub net_amount_minor: i64,
    pub payment_method: PaymentMethod,
    pub observations: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewReservationEntity {
    /// The row as it exists right after insertion.
    pub fn into_entity(self) -> ReservationEntity {
        ReservationEntity {
            id: self.id,
            code: self.code,
            plan_id: self.plan_id,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: self.end_date,
            number_of_people: self.number_of_people,
            gross_amount_minor: self.gross_amount_minor,
            discount_amount_minor: self.discount_amount_minor,
            net_amount_minor: self.net_amount_minor,
            status: ReservationStatus::Pending,
            payment_method: self.payment_method,
            observations: self.observations,
            emergency_contact: self.emergency_contact,
            emergency_phone: self.emergency_phone,
            cancellation_reason: None,
            created_at: self.created_at,
            confirmed_at: None,
            cancelled_at: None,
            updated_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reservations)]
pub struct InsertReservationRow {
    pub id: Uuid,
    pub code: String,
    pub plan_id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_people: i32,
    pub gross_amount_minor: i64,
    pub discount_amount_minor: i64,
    pub net_amount_minor: i64,
    pub status: String,
    pub payment_method: String,
    pub observations: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&NewReservationEntity> for InsertReservationRow {
    fn from(value: &NewReservationEntity) -> Self {
        Self {
            id: value.id,
            code: value.code.clone(),
            plan_id: value.plan_id,
            user_id: value.user_id,
            start_date: value.start_date,
            end_date: value.end_date,
            number_of_people: value.number_of_people,
            gross_amount_minor: value.gross_amount_minor,
            discount_amount_minor: value.discount_amount_minor,
            net_amount_minor: value.net_amount_minor,
            status: ReservationStatus::Pending.to_string(),
            payment_method: value.payment_method.to_string(),
            observations: value.observations.clone(),
            emergency_contact: value.emergency_contact.clone(),
            emergency_phone: value.emergency_phone.clone(),
            created_at: value.created_at,
            updated_at: value.created_at,
        }
    }
}

/// A single compare-and-set step of the reservation lifecycle.
///
/// The store applies it only if the row still has `expected` status.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationTransition {
    pub expected: ReservationStatus,
    pub next: ReservationStatus,
    pub at: DateTime<Utc>,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = reservations)]
pub struct ReservationTransitionChangeset {
    pub status: String,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ReservationTransition> for ReservationTransitionChangeset {
    fn from(value: &ReservationTransition) -> Self {
        let cancelling = value.next == ReservationStatus::Cancelled;
        Self {
            status: value.next.to_string(),
            confirmed_at: (value.next == ReservationStatus::Confirmed).then_some(value.at),
            cancelled_at: cancelling.then_some(value.at),
            cancellation_reason: if cancelling {
                value.cancellation_reason.clone()
            } else {
                None
            },
            updated_at: value.at,
        }
    }
}

impl ReservationEntity {
    /// Applies a transition to an in-memory copy the same way the database changeset does.
    pub fn apply_transition(&mut self, transition: &ReservationTransition) {
        let changes = ReservationTransitionChangeset::from(transition);
        self.status = transition.next;
        if changes.confirmed_at.is_some() {
            self.confirmed_at = changes.confirmed_at;
        }
        if changes.cancelled_at.is_some() {
            self.cancelled_at = changes.cancelled_at;
        }
        if changes.cancellation_reason.is_some() {
            self.cancellation_reason = changes.cancellation_reason;
        }
        self.updated_at = changes.updated_at;
    }
}

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    schema::payments,
    value_objects::enums::{
        payment_methods::PaymentMethod, payment_statuses::PaymentStatus, payment_types::PaymentType,
    },
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub code: String,
    pub reservation_id: Uuid,
    pub amount_minor: i64,
    pub payment_type: PaymentType,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_ref: Option<String>,
    pub authorization_ref: Option<String>,
    pub observations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentRow {
    pub id: Uuid,
    pub code: String,
    pub reservation_id: Uuid,
    pub amount_minor: i64,
    pub payment_type: String,
    pub method: String,
    pub status: String,
    pub transaction_ref: Option<String>,
    pub authorization_ref: Option<String>,
    pub observations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentEntity {
    type Error = anyhow::Error;

    fn try_from(row: PaymentRow) -> Result<Self> {
        let payment_type = PaymentType::from_str(&row.payment_type)
            .ok_or_else(|| anyhow!("payment {} has unknown type {:?}", row.id, row.payment_type))?;
        let method = PaymentMethod::from_str(&row.method)
            .ok_or_else(|| anyhow!("payment {} has unknown method {:?}", row.id, row.method))?;
        let status = PaymentStatus::from_str(&row.status)
            .ok_or_else(|| anyhow!("payment {} has unknown status {:?}", row.id, row.status))?;

        Ok(Self {
            id: row.id,
            code: row.code,
            reservation_id: row.reservation_id,
            amount_minor: row.amount_minor,
            payment_type,
            method,
            status,
            transaction_ref: row.transaction_ref,
            authorization_ref: row.authorization_ref,
            observations: row.observations,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentEntity {
    pub id: Uuid,
    pub code: String,
    pub reservation_id: Uuid,
    pub amount_minor: i64,
    pub payment_type: PaymentType,
    pub method: PaymentMethod,
    pub transaction_ref: Option<String>,
    pub authorization_ref: Option<String>,
    pub observations: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewPaymentEntity {
    pub fn into_entity(self) -> PaymentEntity {
        PaymentEntity {
            id: self.id,
            code: self.code,
            reservation_id: self.reservation_id,
            amount_minor: self.amount_minor,
            payment_type: self.payment_type,
            method: self.method,
            status: PaymentStatus::Pending,
            transaction_ref: self.transaction_ref,
            authorization_ref: self.authorization_ref,
            observations: self.observations,
            created_at: self.created_at,
            confirmed_at: None,
            updated_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub struct InsertPaymentRow {
    pub id: Uuid,
    pub code: String,
    pub reservation_id: Uuid,
    pub amount_minor: i64,
    pub payment_type: String,
    pub method: String,
    pub status: String,
    pub transaction_ref: Option<String>,
    pub authorization_ref: Option<String>,
    pub observations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&NewPaymentEntity> for InsertPaymentRow {
    fn from(value: &NewPaymentEntity) -> Self {
        Self {
            id: value.id,
            code: value.code.clone(),
            reservation_id: value.reservation_id,
            amount_minor: value.amount_minor,
            payment_type: value.payment_type.to_string(),
            method: value.method.to_string(),
            status: PaymentStatus::Pending.to_string(),
            transaction_ref: value.transaction_ref.clone(),
            authorization_ref: value.authorization_ref.clone(),
            observations: value.observations.clone(),
            created_at: value.created_at,
            updated_at: value.created_at,
        }
    }
}

/// Compare-and-set step of the payment lifecycle. `observations`, when set,
/// replaces the stored observations.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentTransition {
    pub expected: PaymentStatus,
    pub next: PaymentStatus,
    pub at: DateTime<Utc>,
    pub observations: Option<String>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = payments)]
pub struct PaymentTransitionChangeset {
    pub status: String,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub observations: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PaymentTransition> for PaymentTransitionChangeset {
    fn from(value: &PaymentTransition) -> Self {
        Self {
            status: value.next.to_string(),
            confirmed_at: (value.next == PaymentStatus::Confirmed).then_some(value.at),
            observations: value.observations.clone(),
            updated_at: value.at,
        }
    }
}

impl PaymentEntity {
    pub fn apply_transition(&mut self, transition: &PaymentTransition) {
        let changes = PaymentTransitionChangeset::from(transition);
        self.status = transition.next;
        if changes.confirmed_at.is_some() {
            self.confirmed_at = changes.confirmed_at;
        }
        if changes.observations.is_some() {
            self.observations = changes.observations;
        }
        self.updated_at = changes.updated_at;
    }
}

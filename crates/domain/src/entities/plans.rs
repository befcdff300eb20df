use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{schema::plans, value_objects::enums::plan_statuses::PlanStatus};

/// A sellable tour product as seen by the booking engine.
///
/// `municipality_owner_id` is the user that owns the plan's municipality and
/// is resolved by the store so authorization needs no extra lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntity {
    pub id: Uuid,
    pub municipality_id: Uuid,
    pub municipality_owner_id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub duration_days: i32,
    pub maximum_capacity: i32,
    pub status: PlanStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw row used for Diesel queries. Status stays as text and is parsed into PlanStatus.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanRow {
    pub id: Uuid,
    pub municipality_id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub duration_days: i32,
    pub maximum_capacity: i32,
    pub status: String,
    pub created_by: Uuid,
    pub removed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanEntity {
    pub fn from_row(row: PlanRow, municipality_owner_id: Uuid) -> Self {
        Self {
            id: row.id,
            municipality_id: row.municipality_id,
            municipality_owner_id,
            name: row.name,
            price_minor: row.price_minor,
            duration_days: row.duration_days,
            maximum_capacity: row.maximum_capacity,
            // Unknown statuses are never bookable.
            status: PlanStatus::from_str(&row.status).unwrap_or(PlanStatus::Inactive),
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlanEntity {
    pub id: Uuid,
    pub municipality_id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub duration_days: i32,
    pub maximum_capacity: i32,
    pub status: PlanStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = plans)]
pub struct InsertPlanRow {
    pub id: Uuid,
    pub municipality_id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub duration_days: i32,
    pub maximum_capacity: i32,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&NewPlanEntity> for InsertPlanRow {
    fn from(value: &NewPlanEntity) -> Self {
        Self {
            id: value.id,
            municipality_id: value.municipality_id,
            name: value.name.clone(),
            price_minor: value.price_minor,
            duration_days: value.duration_days,
            maximum_capacity: value.maximum_capacity,
            status: value.status.to_string(),
            created_by: value.created_by,
            created_at: value.created_at,
            updated_at: value.created_at,
        }
    }
}

/// Result of the store's atomic "remove unless reserved" operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanRemoval {
    Removed,
    NotFound,
    HasOpenReservations(i64),
}

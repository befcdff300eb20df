use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::enums::plan_statuses::PlanStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatePlanModel {
    pub municipality_id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub duration_days: i32,
    pub maximum_capacity: i32,
    #[serde(default)]
    pub status: PlanStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangePlanStatusModel {
    pub status: PlanStatus,
}

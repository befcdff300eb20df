use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::enums::payment_methods::PaymentMethod;

/// Free-form booking details that carry no invariants besides the discount bound.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReservationMetadata {
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub discount_amount_minor: i64,
    pub observations: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateReservationModel {
    pub plan_id: Uuid,
    pub start_date: NaiveDate,
    pub number_of_people: i32,
    #[serde(flatten)]
    pub metadata: ReservationMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CancelReservationModel {
    pub reason: Option<String>,
}

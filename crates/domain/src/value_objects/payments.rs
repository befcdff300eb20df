use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::payments::PaymentEntity,
    value_objects::enums::{payment_methods::PaymentMethod, payment_types::PaymentType},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterPaymentModel {
    pub reservation_id: Uuid,
    pub amount_minor: i64,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub method: PaymentMethod,
    pub transaction_ref: Option<String>,
    pub authorization_ref: Option<String>,
    pub observations: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentReasonModel {
    pub reason: Option<String>,
}

/// How much of a reservation's net amount confirmed payments cover.
///
/// `balance_minor` is negative when the reservation is overpaid; whether that
/// or a positive balance needs action is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub reservation_id: Uuid,
    pub net_amount_minor: i64,
    pub total_confirmed_minor: i64,
    pub balance_minor: i64,
    pub fully_paid: bool,
}

impl Settlement {
    pub fn new(reservation_id: Uuid, net_amount_minor: i64, total_confirmed_minor: i64) -> Self {
        let balance_minor = net_amount_minor - total_confirmed_minor;
        Self {
            reservation_id,
            net_amount_minor,
            total_confirmed_minor,
            balance_minor,
            fully_paid: balance_minor <= 0,
        }
    }
}

/// A payment together with its reservation's settlement after the operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentReceipt {
    pub payment: PaymentEntity,
    pub settlement: Settlement,
}

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::value_objects::transitions::InvalidTransition;

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAction {
    Confirm,
    Reject,
    Refund,
}

impl PaymentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentAction::Confirm => "confirm",
            PaymentAction::Reject => "reject",
            PaymentAction::Refund => "refund",
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Confirmed => "CONFIRMED",
            PaymentStatus::Rejected => "REJECTED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(PaymentStatus::Pending),
            "CONFIRMED" => Some(PaymentStatus::Confirmed),
            // Legacy rows written before the rename.
            "REJECTED" | "FAILED" => Some(PaymentStatus::Rejected),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }

    /// `PENDING -> CONFIRMED | REJECTED`, and `CONFIRMED -> REFUNDED`.
    pub fn apply(self, action: PaymentAction) -> Result<PaymentStatus, InvalidTransition> {
        use PaymentAction as Action;
        use PaymentStatus as Status;

        let rejected = |message| Err(InvalidTransition::new(self.as_str(), action.as_str(), message));

        match (self, action) {
            (Status::Pending, Action::Confirm) => Ok(Status::Confirmed),
            (Status::Pending, Action::Reject) => Ok(Status::Rejected),
            (Status::Confirmed, Action::Refund) => Ok(Status::Refunded),

            (Status::Confirmed | Status::Rejected | Status::Refunded, Action::Confirm) => {
                rejected("only pending payments can be confirmed")
            }
            (Status::Confirmed | Status::Rejected | Status::Refunded, Action::Reject) => {
                rejected("only pending payments can be rejected")
            }
            (Status::Pending | Status::Rejected | Status::Refunded, Action::Refund) => {
                rejected("only confirmed payments can be refunded")
            }
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_payment_can_be_confirmed_or_rejected() {
        assert_eq!(
            PaymentStatus::Pending.apply(PaymentAction::Confirm),
            Ok(PaymentStatus::Confirmed)
        );
        assert_eq!(
            PaymentStatus::Pending.apply(PaymentAction::Reject),
            Ok(PaymentStatus::Rejected)
        );
    }

    #[test]
    fn confirmed_payment_only_moves_to_refunded() {
        assert_eq!(
            PaymentStatus::Confirmed.apply(PaymentAction::Refund),
            Ok(PaymentStatus::Refunded)
        );
        let err = PaymentStatus::Confirmed
            .apply(PaymentAction::Confirm)
            .unwrap_err();
        assert_eq!(err.to_string(), "only pending payments can be confirmed");
        assert!(PaymentStatus::Confirmed.apply(PaymentAction::Reject).is_err());
    }

    #[test]
    fn rejected_and_refunded_are_terminal() {
        for status in [PaymentStatus::Rejected, PaymentStatus::Refunded] {
            for action in [PaymentAction::Confirm, PaymentAction::Reject, PaymentAction::Refund] {
                assert!(status.apply(action).is_err(), "{status} accepted {action:?}");
            }
        }
    }

    #[test]
    fn legacy_failed_rows_read_as_rejected() {
        assert_eq!(PaymentStatus::from_str("FAILED"), Some(PaymentStatus::Rejected));
    }
}

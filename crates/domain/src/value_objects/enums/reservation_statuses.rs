use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::value_objects::transitions::InvalidTransition;

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationAction {
    Confirm,
    Start,
    Complete,
    Cancel,
}

impl ReservationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationAction::Confirm => "confirm",
            ReservationAction::Start => "start",
            ReservationAction::Complete => "complete",
            ReservationAction::Cancel => "cancel",
        }
    }
}

impl ReservationStatus {
    /// Statuses whose party size counts against the plan's capacity for the start date.
    pub const HOLDING_CAPACITY: [ReservationStatus; 4] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::InProgress,
        ReservationStatus::Completed,
    ];

    /// Non-terminal statuses. A plan with reservations in any of these cannot be removed.
    pub const OPEN: [ReservationStatus; 3] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::InProgress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::InProgress => "IN_PROGRESS",
            ReservationStatus::Completed => "COMPLETED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(ReservationStatus::Pending),
            "CONFIRMED" => Some(ReservationStatus::Confirmed),
            "IN_PROGRESS" => Some(ReservationStatus::InProgress),
            "COMPLETED" => Some(ReservationStatus::Completed),
            "CANCELLED" => Some(ReservationStatus::Cancelled),
            _ => None,
        }
    }

    pub fn holds_capacity(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled)
    }

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }

    /// The reservation lifecycle:
    /// `PENDING -> CONFIRMED -> IN_PROGRESS -> COMPLETED`, with `CANCELLED`
    /// reachable from `PENDING` and `CONFIRMED` only.
    pub fn apply(self, action: ReservationAction) -> Result<ReservationStatus, InvalidTransition> {
        use ReservationAction as Action;
        use ReservationStatus as Status;

        let rejected = |message| Err(InvalidTransition::new(self.as_str(), action.as_str(), message));

        match (self, action) {
            (Status::Pending, Action::Confirm) => Ok(Status::Confirmed),
            (Status::Confirmed, Action::Start) => Ok(Status::InProgress),
            (Status::InProgress, Action::Complete) => Ok(Status::Completed),
            (Status::Pending | Status::Confirmed, Action::Cancel) => Ok(Status::Cancelled),

            (
                Status::Confirmed | Status::InProgress | Status::Completed | Status::Cancelled,
                Action::Confirm,
            ) => rejected("only pending reservations can be confirmed"),
            (
                Status::Pending | Status::InProgress | Status::Completed | Status::Cancelled,
                Action::Start,
            ) => rejected("only confirmed reservations can be started"),
            (
                Status::Pending | Status::Confirmed | Status::Completed | Status::Cancelled,
                Action::Complete,
            ) => rejected("only in-progress reservations can be completed"),
            (Status::Completed, Action::Cancel) => rejected("cannot cancel a completed reservation"),
            (Status::Cancelled, Action::Cancel) => rejected("reservation is already cancelled"),
            (Status::InProgress, Action::Cancel) => rejected(
                "cannot cancel an in-progress reservation; only pending or confirmed reservations can be cancelled",
            ),
        }
    }
}

impl Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ReservationStatus; 5] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::InProgress,
        ReservationStatus::Completed,
        ReservationStatus::Cancelled,
    ];

    const ACTIONS: [ReservationAction; 4] = [
        ReservationAction::Confirm,
        ReservationAction::Start,
        ReservationAction::Complete,
        ReservationAction::Cancel,
    ];

    #[test]
    fn happy_path_walks_the_lifecycle_in_order() {
        let status = ReservationStatus::Pending
            .apply(ReservationAction::Confirm)
            .and_then(|s| s.apply(ReservationAction::Start))
            .and_then(|s| s.apply(ReservationAction::Complete))
            .unwrap();
        assert_eq!(status, ReservationStatus::Completed);
    }

    #[test]
    fn only_the_documented_edges_exist() {
        let allowed = [
            (ReservationStatus::Pending, ReservationAction::Confirm),
            (ReservationStatus::Confirmed, ReservationAction::Start),
            (ReservationStatus::InProgress, ReservationAction::Complete),
            (ReservationStatus::Pending, ReservationAction::Cancel),
            (ReservationStatus::Confirmed, ReservationAction::Cancel),
        ];

        for status in ALL {
            for action in ACTIONS {
                let result = status.apply(action);
                assert_eq!(
                    result.is_ok(),
                    allowed.contains(&(status, action)),
                    "{status} --{}--> {result:?}",
                    action.as_str()
                );
            }
        }
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for status in [ReservationStatus::Completed, ReservationStatus::Cancelled] {
            for action in ACTIONS {
                assert!(status.apply(action).is_err());
            }
        }
    }

    #[test]
    fn completing_a_confirmed_reservation_names_the_required_state() {
        let err = ReservationStatus::Confirmed
            .apply(ReservationAction::Complete)
            .unwrap_err();
        assert_eq!(err.from, "CONFIRMED");
        assert_eq!(err.to_string(), "only in-progress reservations can be completed");
    }

    #[test]
    fn cancelling_a_completed_reservation_is_rejected() {
        let err = ReservationStatus::Completed
            .apply(ReservationAction::Cancel)
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot cancel a completed reservation");
    }

    #[test]
    fn cancelled_reservations_release_capacity() {
        for status in ALL {
            assert_eq!(
                status.holds_capacity(),
                ReservationStatus::HOLDING_CAPACITY.contains(&status)
            );
        }
        assert!(!ReservationStatus::Cancelled.holds_capacity());
        assert!(ReservationStatus::Completed.holds_capacity());
        assert!(!ReservationStatus::Completed.is_open());
    }

    #[test]
    fn stored_names_round_trip() {
        for status in ALL {
            assert_eq!(ReservationStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ReservationStatus::from_str("pending"), None);
    }
}

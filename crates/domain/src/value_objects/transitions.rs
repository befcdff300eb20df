use thiserror::Error;

/// An edge that does not exist in a lifecycle state machine.
///
/// `message` always names the source state the action requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvalidTransition {
    pub from: &'static str,
    pub action: &'static str,
    pub message: &'static str,
}

impl InvalidTransition {
    pub fn new(from: &'static str, action: &'static str, message: &'static str) -> Self {
        Self {
            from,
            action,
            message,
        }
    }
}

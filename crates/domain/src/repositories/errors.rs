use thiserror::Error;

/// A generated human-readable code collided with one already stored.
/// Stores return it inside `anyhow::Error` so callers can downcast and retry.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{entity} code {code} is already taken")]
pub struct DuplicateCode {
    pub entity: &'static str,
    pub code: String,
}

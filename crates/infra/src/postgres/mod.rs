pub mod postgres_connection;
pub mod repositories;

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use domain::repositories::errors::DuplicateCode;

/// Turns a unique violation on a `code` column into `DuplicateCode`.
pub(crate) fn code_violation(err: DieselError, entity: &'static str, code: &str) -> anyhow::Error {
    match &err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info
                .constraint_name()
                .is_some_and(|constraint| constraint.ends_with("_code_key")) =>
        {
            DuplicateCode {
                entity,
                code: code.to_string(),
            }
            .into()
        }
        _ => err.into(),
    }
}

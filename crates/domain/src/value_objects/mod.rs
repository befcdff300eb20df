pub mod admission;
pub mod enums;
pub mod iam;
pub mod payments;
pub mod plans;
pub mod reservations;
pub mod transitions;

pub mod access_policy;
pub mod capacity_ledger;
pub mod codes;
pub mod errors;
pub mod payments;
pub mod plans;
pub mod reservations;

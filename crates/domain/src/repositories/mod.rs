pub mod errors;
pub mod municipalities;
pub mod payments;
pub mod plans;
pub mod reservations;

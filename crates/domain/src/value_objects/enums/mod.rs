pub mod payment_methods;
pub mod payment_statuses;
pub mod payment_types;
pub mod plan_statuses;
pub mod reservation_statuses;
pub mod roles;

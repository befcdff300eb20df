use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::{
    entities::reservations::{NewReservationEntity, ReservationEntity, ReservationTransition},
    value_objects::admission::AdmissionOutcome,
};

#[async_trait]
#[automock]
pub trait ReservationRepository {
    /// Sum of party sizes of reservations on `plan_id` starting `start_date`
    /// whose status still holds capacity.
    async fn committed_people(&self, plan_id: Uuid, start_date: NaiveDate) -> Result<i64>;

    /// Re-evaluates admission for the reservation's plan and date and inserts
    /// it only when admitted, in a single atomic unit.
    async fn insert_admitted(
        &self,
        reservation: NewReservationEntity,
        booked_at: DateTime<Utc>,
    ) -> Result<AdmissionOutcome>;

    async fn find_by_id(&self, reservation_id: Uuid) -> Result<Option<ReservationEntity>>;

    async fn find_by_code(&self, code: String) -> Result<Option<ReservationEntity>>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<ReservationEntity>>;

    async fn list_by_plan(&self, plan_id: Uuid) -> Result<Vec<ReservationEntity>>;

    async fn list_by_municipality(&self, municipality_id: Uuid) -> Result<Vec<ReservationEntity>>;

    /// Applies `transition` only if the stored status still equals
    /// `transition.expected`. `Ok(None)` means the row changed underneath
    /// the caller (or vanished).
    async fn apply_transition(
        &self,
        reservation_id: Uuid,
        transition: ReservationTransition,
    ) -> Result<Option<ReservationEntity>>;
}

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::{
    entities::plans::{NewPlanEntity, PlanEntity, PlanRemoval},
    value_objects::enums::plan_statuses::PlanStatus,
};

#[async_trait]
#[automock]
pub trait PlanRepository {
    /// Looks up a plan that has not been removed.
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>>;

    /// Owner of the municipality a plan belongs to, removed or not.
    async fn find_municipality_owner(&self, plan_id: Uuid) -> Result<Option<Uuid>>;

    async fn insert(&self, plan: NewPlanEntity) -> Result<PlanEntity>;

    async fn update_status(
        &self,
        plan_id: Uuid,
        status: PlanStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<PlanEntity>>;

    /// Soft-removes the plan unless it has reservations in an open status.
    /// The check and the removal are one atomic step with respect to bookings.
    async fn remove_if_unreserved(
        &self,
        plan_id: Uuid,
        removed_at: DateTime<Utc>,
    ) -> Result<PlanRemoval>;
}

use std::sync::Arc;

use chrono::Utc;
use domain::{
    entities::plans::{NewPlanEntity, PlanEntity, PlanRemoval},
    repositories::{municipalities::MunicipalityRepository, plans::PlanRepository},
    value_objects::{
        enums::plan_statuses::PlanStatus, iam::Principal, plans::CreatePlanModel,
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    access_policy::{AccessPolicy, RequiredRole, authorize},
    errors::{BookingError, UseCaseResult},
};

fn storage_error(operation: &'static str) -> impl FnOnce(anyhow::Error) -> BookingError {
    move |err| {
        error!(operation, db_error = ?err, "plans: storage failure");
        BookingError::Internal(err)
    }
}

pub struct PlanUseCase<P, M, A>
where
    P: PlanRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    plan_repo: Arc<P>,
    municipality_repo: Arc<M>,
    access_policy: Arc<A>,
}

impl<P, M, A> PlanUseCase<P, M, A>
where
    P: PlanRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    pub fn new(plan_repo: Arc<P>, municipality_repo: Arc<M>, access_policy: Arc<A>) -> Self {
        Self {
            plan_repo,
            municipality_repo,
            access_policy,
        }
    }

    pub async fn create_plan(
        &self,
        model: CreatePlanModel,
        principal: &Principal,
    ) -> UseCaseResult<PlanEntity> {
        let municipality_id = model.municipality_id;
        info!(%municipality_id, name = %model.name, "plans: creation requested");

        let owner_id = self
            .municipality_repo
            .find_owner_id(municipality_id)
            .await
            .map_err(storage_error("load municipality owner"))?
            .ok_or_else(|| BookingError::not_found("municipality", municipality_id))?;

        authorize(
            self.access_policy.as_ref(),
            principal,
            None,
            Some(owner_id),
            RequiredRole::MunicipalityOwner,
            "create plans for this municipality",
        )?;

        let name = model.name.trim();
        if name.is_empty() {
            return Err(BookingError::Validation("plan name is required".to_string()));
        }
        if model.maximum_capacity < 1 {
            return Err(BookingError::Validation(
                "maximum capacity must be at least 1".to_string(),
            ));
        }
        if model.price_minor < 0 {
            return Err(BookingError::Validation(
                "price must not be negative".to_string(),
            ));
        }
        if model.duration_days < 1 {
            return Err(BookingError::Validation(
                "duration must be at least one day".to_string(),
            ));
        }

        let plan = self
            .plan_repo
            .insert(NewPlanEntity {
                id: Uuid::new_v4(),
                municipality_id,
                name: name.to_string(),
                price_minor: model.price_minor,
                duration_days: model.duration_days,
                maximum_capacity: model.maximum_capacity,
                status: model.status,
                created_by: principal.user_id,
                created_at: Utc::now(),
            })
            .await
            .map_err(storage_error("insert plan"))?;

        info!(
            plan_id = %plan.id,
            %municipality_id,
            maximum_capacity = plan.maximum_capacity,
            status = %plan.status,
            "plans: plan created"
        );
        Ok(plan)
    }

    pub async fn get(&self, plan_id: Uuid) -> UseCaseResult<PlanEntity> {
        self.load(plan_id).await
    }

    pub async fn change_status(
        &self,
        plan_id: Uuid,
        status: PlanStatus,
        principal: &Principal,
    ) -> UseCaseResult<PlanEntity> {
        let plan = self.load(plan_id).await?;
        self.authorize_owner(&plan, principal, "change this plan's status")?;

        let updated = self
            .plan_repo
            .update_status(plan_id, status, Utc::now())
            .await
            .map_err(storage_error("update plan status"))?
            .ok_or_else(|| BookingError::not_found("plan", plan_id))?;

        info!(
            %plan_id,
            from = %plan.status,
            to = %updated.status,
            "plans: status changed"
        );
        Ok(updated)
    }

    /// Soft removal; refused while the plan still has open reservations.
    pub async fn remove_plan(&self, plan_id: Uuid, principal: &Principal) -> UseCaseResult<()> {
        let plan = self.load(plan_id).await?;
        self.authorize_owner(&plan, principal, "remove this plan")?;

        match self
            .plan_repo
            .remove_if_unreserved(plan_id, Utc::now())
            .await
            .map_err(storage_error("remove plan"))?
        {
            PlanRemoval::Removed => {
                info!(%plan_id, "plans: plan removed");
                Ok(())
            }
            PlanRemoval::NotFound => Err(BookingError::not_found("plan", plan_id)),
            PlanRemoval::HasOpenReservations(open) => {
                warn!(%plan_id, open, "plans: removal refused, open reservations");
                Err(BookingError::PlanUnavailable(format!(
                    "plan {plan_id} has {open} open reservations"
                )))
            }
        }
    }

    async fn load(&self, plan_id: Uuid) -> UseCaseResult<PlanEntity> {
        self.plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(storage_error("load plan"))?
            .ok_or_else(|| BookingError::not_found("plan", plan_id))
    }

    fn authorize_owner(
        &self,
        plan: &PlanEntity,
        principal: &Principal,
        action: &str,
    ) -> UseCaseResult<()> {
        authorize(
            self.access_policy.as_ref(),
            principal,
            None,
            Some(plan.municipality_owner_id),
            RequiredRole::MunicipalityOwner,
            action,
        )
    }
}

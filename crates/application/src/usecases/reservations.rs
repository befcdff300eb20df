use std::sync::Arc;

use chrono::{Duration, Utc};
use domain::{
    entities::{
        plans::PlanEntity,
        reservations::{NewReservationEntity, ReservationEntity, ReservationTransition},
    },
    repositories::{
        errors::DuplicateCode, municipalities::MunicipalityRepository, plans::PlanRepository,
        reservations::ReservationRepository,
    },
    value_objects::{
        admission::{Admission, AdmissionOutcome},
        enums::{plan_statuses::PlanStatus, reservation_statuses::ReservationAction},
        iam::Principal,
        reservations::CreateReservationModel,
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    access_policy::{AccessPolicy, RequiredRole, authorize},
    capacity_ledger::CapacityLedger,
    codes,
    errors::{BookingError, UseCaseResult},
};

fn storage_error(operation: &'static str) -> impl FnOnce(anyhow::Error) -> BookingError {
    move |err| {
        error!(operation, db_error = ?err, "reservations: storage failure");
        BookingError::Internal(err)
    }
}

/// Drives a reservation through `PENDING -> CONFIRMED -> IN_PROGRESS -> COMPLETED`
/// (or `CANCELLED` from the first two) and books new ones against plan capacity.
pub struct ReservationUseCase<P, R, M, A>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    plan_repo: Arc<P>,
    reservation_repo: Arc<R>,
    municipality_repo: Arc<M>,
    access_policy: Arc<A>,
    capacity: CapacityLedger<P, R>,
}

impl<P, R, M, A> ReservationUseCase<P, R, M, A>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    pub fn new(
        plan_repo: Arc<P>,
        reservation_repo: Arc<R>,
        municipality_repo: Arc<M>,
        access_policy: Arc<A>,
    ) -> Self {
        let capacity = CapacityLedger::new(Arc::clone(&plan_repo), Arc::clone(&reservation_repo));
        Self {
            plan_repo,
            reservation_repo,
            municipality_repo,
            access_policy,
            capacity,
        }
    }

    pub fn capacity(&self) -> &CapacityLedger<P, R> {
        &self.capacity
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        model: CreateReservationModel,
        principal: &Principal,
    ) -> UseCaseResult<ReservationEntity> {
        let plan_id = model.plan_id;
        let start_date = model.start_date;
        let people = model.number_of_people;
        info!(
            %user_id,
            %plan_id,
            %start_date,
            people,
            "reservations: booking requested"
        );

        authorize(
            self.access_policy.as_ref(),
            principal,
            Some(user_id),
            None,
            RequiredRole::ResourceOwner,
            "book on behalf of this user",
        )?;

        let plan = self
            .plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(storage_error("load plan"))?
            .ok_or_else(|| {
                warn!(%user_id, %plan_id, "reservations: plan not found");
                BookingError::PlanUnavailable(format!("plan {plan_id} does not exist"))
            })?;

        if plan.status != PlanStatus::Active {
            warn!(
                %user_id,
                %plan_id,
                status = %plan.status,
                "reservations: plan is not available for booking"
            );
            return Err(BookingError::PlanUnavailable(format!(
                "plan {plan_id} is {}",
                plan.status
            )));
        }

        // Plan availability outranks request validation.
        if people < 1 {
            warn!(%user_id, %plan_id, people, "reservations: non-positive party size");
            return Err(BookingError::Validation(
                "number of people must be at least 1".to_string(),
            ));
        }

        let booked_at = Utc::now();
        if start_date <= booked_at.date_naive() {
            warn!(%user_id, %plan_id, %start_date, "reservations: start date is not in the future");
            return Err(BookingError::Validation(format!(
                "start date {start_date} must be in the future"
            )));
        }

        let new_reservation = self.build_reservation(user_id, &plan, model, booked_at)?;

        // Early rejection; the store re-checks atomically on insert.
        if let Admission::Rejected(rejections) = self
            .capacity
            .admit_plan(&plan, start_date, people, booked_at)
            .await?
        {
            warn!(%user_id, %plan_id, %start_date, ?rejections, "reservations: admission rejected");
            return Err(BookingError::from_rejections(&rejections));
        }

        match self.insert_with_fresh_code(new_reservation, booked_at).await? {
            AdmissionOutcome::Admitted(reservation) => {
                info!(
                    reservation_id = %reservation.id,
                    code = %reservation.code,
                    %plan_id,
                    %start_date,
                    people,
                    net_amount_minor = reservation.net_amount_minor,
                    "reservations: reservation created"
                );
                Ok(reservation)
            }
            AdmissionOutcome::PlanNotFound => {
                warn!(%user_id, %plan_id, "reservations: plan vanished before insert");
                Err(BookingError::PlanUnavailable(format!(
                    "plan {plan_id} does not exist"
                )))
            }
            AdmissionOutcome::Rejected(rejections) => {
                warn!(
                    %user_id,
                    %plan_id,
                    %start_date,
                    ?rejections,
                    "reservations: admission rejected at insert"
                );
                Err(BookingError::from_rejections(&rejections))
            }
        }
    }

    /// Inserts the reservation, drawing one new code if the first is taken.
    async fn insert_with_fresh_code(
        &self,
        mut reservation: NewReservationEntity,
        booked_at: chrono::DateTime<Utc>,
    ) -> UseCaseResult<AdmissionOutcome> {
        match self
            .reservation_repo
            .insert_admitted(reservation.clone(), booked_at)
            .await
        {
            Ok(outcome) => return Ok(outcome),
            Err(err) => match err.downcast_ref::<DuplicateCode>() {
                Some(duplicate) => {
                    warn!(code = %duplicate.code, "reservations: code collision, drawing a new one");
                }
                None => return Err(storage_error("insert reservation")(err)),
            },
        }

        reservation.code = codes::reservation_code(booked_at);
        self.reservation_repo
            .insert_admitted(reservation, booked_at)
            .await
            .map_err(|err| match err.downcast_ref::<DuplicateCode>() {
                Some(duplicate) => {
                    warn!(code = %duplicate.code, "reservations: code collided twice");
                    BookingError::conflict("reservation code", &duplicate.code)
                }
                None => storage_error("insert reservation")(err),
            })
    }

    fn build_reservation(
        &self,
        user_id: Uuid,
        plan: &PlanEntity,
        model: CreateReservationModel,
        booked_at: chrono::DateTime<Utc>,
    ) -> UseCaseResult<NewReservationEntity> {
        let gross = plan
            .price_minor
            .checked_mul(i64::from(model.number_of_people))
            .ok_or_else(|| BookingError::Validation("gross amount overflows".to_string()))?;

        let discount = model.metadata.discount_amount_minor;
        if discount < 0 || discount > gross {
            return Err(BookingError::Validation(format!(
                "discount {discount} must be between 0 and the gross amount {gross}"
            )));
        }

        let end_date = model
            .start_date
            .checked_add_signed(Duration::days(i64::from(plan.duration_days)))
            .ok_or_else(|| BookingError::Validation("end date is out of range".to_string()))?;

        Ok(NewReservationEntity {
            id: Uuid::new_v4(),
            code: codes::reservation_code(booked_at),
            plan_id: plan.id,
            user_id,
            start_date: model.start_date,
            end_date,
            number_of_people: model.number_of_people,
            gross_amount_minor: gross,
            discount_amount_minor: discount,
            net_amount_minor: gross - discount,
            payment_method: model.metadata.payment_method,
            observations: model.metadata.observations,
            emergency_contact: model.metadata.emergency_contact,
            emergency_phone: model.metadata.emergency_phone,
            created_at: booked_at,
        })
    }

    pub async fn confirm(
        &self,
        reservation_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<ReservationEntity> {
        self.transition(
            reservation_id,
            ReservationAction::Confirm,
            None,
            principal,
            RequiredRole::MunicipalityOwner,
        )
        .await
    }

    /// Operational step taken when the tour begins.
    pub async fn start(
        &self,
        reservation_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<ReservationEntity> {
        self.transition(
            reservation_id,
            ReservationAction::Start,
            None,
            principal,
            RequiredRole::MunicipalityOwner,
        )
        .await
    }

    pub async fn complete(
        &self,
        reservation_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<ReservationEntity> {
        self.transition(
            reservation_id,
            ReservationAction::Complete,
            None,
            principal,
            RequiredRole::MunicipalityOwner,
        )
        .await
    }

    /// `reason` is stored as given, empty or absent included.
    pub async fn cancel(
        &self,
        reservation_id: Uuid,
        reason: Option<String>,
        principal: &Principal,
    ) -> UseCaseResult<ReservationEntity> {
        self.transition(
            reservation_id,
            ReservationAction::Cancel,
            reason,
            principal,
            RequiredRole::OwnerOrMunicipality,
        )
        .await
    }

    async fn transition(
        &self,
        reservation_id: Uuid,
        action: ReservationAction,
        cancellation_reason: Option<String>,
        principal: &Principal,
        required: RequiredRole,
    ) -> UseCaseResult<ReservationEntity> {
        info!(
            %reservation_id,
            action = action.as_str(),
            user_id = %principal.user_id,
            "reservations: transition requested"
        );

        let reservation = self.load(reservation_id).await?;
        let municipality_owner_id = self.municipality_owner_of_plan(reservation.plan_id).await?;

        authorize(
            self.access_policy.as_ref(),
            principal,
            Some(reservation.user_id),
            municipality_owner_id,
            required,
            &format!("{} this reservation", action.as_str()),
        )?;

        let next = reservation.status.apply(action).map_err(|err| {
            warn!(
                %reservation_id,
                from = %reservation.status,
                action = action.as_str(),
                "reservations: invalid transition"
            );
            BookingError::from(err)
        })?;

        let transition = ReservationTransition {
            expected: reservation.status,
            next,
            at: Utc::now(),
            cancellation_reason,
        };

        match self
            .reservation_repo
            .apply_transition(reservation_id, transition)
            .await
            .map_err(storage_error("apply reservation transition"))?
        {
            Some(updated) => {
                info!(
                    %reservation_id,
                    from = %reservation.status,
                    to = %updated.status,
                    "reservations: status changed"
                );
                Ok(updated)
            }
            None => {
                warn!(
                    %reservation_id,
                    expected = %reservation.status,
                    "reservations: status changed concurrently"
                );
                Err(BookingError::conflict("reservation", reservation_id))
            }
        }
    }

    pub async fn get(
        &self,
        reservation_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<ReservationEntity> {
        let reservation = self.load(reservation_id).await?;
        self.authorize_view(&reservation, principal).await?;
        Ok(reservation)
    }

    pub async fn get_by_code(
        &self,
        code: String,
        principal: &Principal,
    ) -> UseCaseResult<ReservationEntity> {
        let reservation = self
            .reservation_repo
            .find_by_code(code.clone())
            .await
            .map_err(storage_error("find reservation by code"))?
            .ok_or_else(|| BookingError::not_found("reservation", code))?;
        self.authorize_view(&reservation, principal).await?;
        Ok(reservation)
    }

    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<Vec<ReservationEntity>> {
        authorize(
            self.access_policy.as_ref(),
            principal,
            Some(user_id),
            None,
            RequiredRole::ResourceOwner,
            "list this user's reservations",
        )?;

        self.reservation_repo
            .list_by_user(user_id)
            .await
            .map_err(storage_error("list reservations by user"))
    }

    pub async fn list_by_plan(
        &self,
        plan_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<Vec<ReservationEntity>> {
        let owner_id = self
            .municipality_owner_of_plan(plan_id)
            .await?
            .ok_or_else(|| BookingError::not_found("plan", plan_id))?;

        authorize(
            self.access_policy.as_ref(),
            principal,
            None,
            Some(owner_id),
            RequiredRole::MunicipalityOwner,
            "list this plan's reservations",
        )?;

        self.reservation_repo
            .list_by_plan(plan_id)
            .await
            .map_err(storage_error("list reservations by plan"))
    }

    pub async fn list_by_municipality(
        &self,
        municipality_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<Vec<ReservationEntity>> {
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
            "list this municipality's reservations",
        )?;

        self.reservation_repo
            .list_by_municipality(municipality_id)
            .await
            .map_err(storage_error("list reservations by municipality"))
    }

    async fn load(&self, reservation_id: Uuid) -> UseCaseResult<ReservationEntity> {
        self.reservation_repo
            .find_by_id(reservation_id)
            .await
            .map_err(storage_error("load reservation"))?
            .ok_or_else(|| {
                warn!(%reservation_id, "reservations: reservation not found");
                BookingError::not_found("reservation", reservation_id)
            })
    }

    async fn municipality_owner_of_plan(&self, plan_id: Uuid) -> UseCaseResult<Option<Uuid>> {
        self.plan_repo
            .find_municipality_owner(plan_id)
            .await
            .map_err(storage_error("load plan owner"))
    }

    async fn authorize_view(
        &self,
        reservation: &ReservationEntity,
        principal: &Principal,
    ) -> UseCaseResult<()> {
        let municipality_owner_id = self.municipality_owner_of_plan(reservation.plan_id).await?;
        authorize(
            self.access_policy.as_ref(),
            principal,
            Some(reservation.user_id),
            municipality_owner_id,
            RequiredRole::OwnerOrMunicipality,
            "view this reservation",
        )
    }
}

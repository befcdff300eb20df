use std::sync::Arc;

use chrono::Utc;
use domain::{
    entities::{
        payments::{NewPaymentEntity, PaymentEntity, PaymentTransition},
        reservations::ReservationEntity,
    },
    repositories::{
        errors::DuplicateCode, municipalities::MunicipalityRepository, payments::PaymentRepository,
        plans::PlanRepository, reservations::ReservationRepository,
    },
    value_objects::{
        enums::{payment_statuses::PaymentAction, reservation_statuses::ReservationStatus},
        iam::Principal,
        payments::{PaymentReceipt, RegisterPaymentModel, Settlement},
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    access_policy::{AccessPolicy, RequiredRole, authorize},
    codes,
    errors::{BookingError, UseCaseResult},
};

fn storage_error(operation: &'static str) -> impl FnOnce(anyhow::Error) -> BookingError {
    move |err| {
        error!(operation, db_error = ?err, "payments: storage failure");
        BookingError::Internal(err)
    }
}

/// Folds a rejection or refund reason into the payment's observations,
/// keeping whatever was recorded at registration.
fn tagged_observation(existing: Option<&str>, tag: &str, reason: Option<&str>) -> String {
    let note = format!("{tag}: {}", reason.unwrap_or_default());
    match existing {
        Some(existing) if !existing.is_empty() => format!("{existing}\n{note}"),
        _ => note,
    }
}

/// Ledger of payment attempts against reservations.
///
/// Payments never move the reservation's own status; the settlement returned
/// alongside each mutation is informational.
pub struct PaymentUseCase<P, R, Pay, M, A>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    plan_repo: Arc<P>,
    reservation_repo: Arc<R>,
    payment_repo: Arc<Pay>,
    municipality_repo: Arc<M>,
    access_policy: Arc<A>,
}

impl<P, R, Pay, M, A> PaymentUseCase<P, R, Pay, M, A>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    pub fn new(
        plan_repo: Arc<P>,
        reservation_repo: Arc<R>,
        payment_repo: Arc<Pay>,
        municipality_repo: Arc<M>,
        access_policy: Arc<A>,
    ) -> Self {
        Self {
            plan_repo,
            reservation_repo,
            payment_repo,
            municipality_repo,
            access_policy,
        }
    }

    pub async fn register(
        &self,
        model: RegisterPaymentModel,
        principal: &Principal,
    ) -> UseCaseResult<PaymentReceipt> {
        let reservation_id = model.reservation_id;
        info!(
            %reservation_id,
            amount_minor = model.amount_minor,
            payment_type = %model.payment_type,
            method = %model.method,
            "payments: registration requested"
        );

        let reservation = self.load_reservation(reservation_id).await?;

        authorize(
            self.access_policy.as_ref(),
            principal,
            Some(reservation.user_id),
            None,
            RequiredRole::ResourceOwner,
            "register a payment for this reservation",
        )?;

        if reservation.status == ReservationStatus::Cancelled {
            warn!(%reservation_id, "payments: reservation is cancelled");
            return Err(BookingError::ReservationNotBookable(
                "reservation is cancelled".to_string(),
            ));
        }

        if model.amount_minor <= 0 {
            warn!(
                %reservation_id,
                amount_minor = model.amount_minor,
                "payments: non-positive amount"
            );
            return Err(BookingError::Validation(
                "payment amount must be greater than zero".to_string(),
            ));
        }

        let created_at = Utc::now();
        let payment = self
            .insert_with_fresh_code(NewPaymentEntity {
                id: Uuid::new_v4(),
                code: codes::payment_code(created_at),
                reservation_id,
                amount_minor: model.amount_minor,
                payment_type: model.payment_type,
                method: model.method,
                transaction_ref: model.transaction_ref,
                authorization_ref: model.authorization_ref,
                observations: model.observations,
                created_at,
            })
            .await?;

        info!(
            payment_id = %payment.id,
            code = %payment.code,
            %reservation_id,
            amount_minor = payment.amount_minor,
            "payments: payment registered"
        );

        self.receipt(payment, &reservation).await
    }

    /// Inserts the payment, drawing one new code if the first is taken.
    async fn insert_with_fresh_code(
        &self,
        mut payment: NewPaymentEntity,
    ) -> UseCaseResult<PaymentEntity> {
        match self.payment_repo.insert(payment.clone()).await {
            Ok(stored) => return Ok(stored),
            Err(err) => match err.downcast_ref::<DuplicateCode>() {
                Some(duplicate) => {
                    warn!(code = %duplicate.code, "payments: code collision, drawing a new one");
                }
                None => return Err(storage_error("insert payment")(err)),
            },
        }

        payment.code = codes::payment_code(payment.created_at);
        self.payment_repo
            .insert(payment)
            .await
            .map_err(|err| match err.downcast_ref::<DuplicateCode>() {
                Some(duplicate) => {
                    warn!(code = %duplicate.code, "payments: code collided twice");
                    BookingError::conflict("payment code", &duplicate.code)
                }
                None => storage_error("insert payment")(err),
            })
    }

    pub async fn confirm(
        &self,
        payment_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<PaymentReceipt> {
        self.transition(payment_id, PaymentAction::Confirm, None, principal)
            .await
    }

    pub async fn reject(
        &self,
        payment_id: Uuid,
        reason: Option<String>,
        principal: &Principal,
    ) -> UseCaseResult<PaymentReceipt> {
        self.transition(payment_id, PaymentAction::Reject, reason, principal)
            .await
    }

    pub async fn refund(
        &self,
        payment_id: Uuid,
        reason: Option<String>,
        principal: &Principal,
    ) -> UseCaseResult<PaymentReceipt> {
        self.transition(payment_id, PaymentAction::Refund, reason, principal)
            .await
    }

    async fn transition(
        &self,
        payment_id: Uuid,
        action: PaymentAction,
        reason: Option<String>,
        principal: &Principal,
    ) -> UseCaseResult<PaymentReceipt> {
        info!(
            %payment_id,
            action = action.as_str(),
            user_id = %principal.user_id,
            "payments: transition requested"
        );

        let payment = self.load_payment(payment_id).await?;
        let reservation = self.load_reservation(payment.reservation_id).await?;
        let municipality_owner_id = self.municipality_owner_of_plan(reservation.plan_id).await?;

        authorize(
            self.access_policy.as_ref(),
            principal,
            None,
            municipality_owner_id,
            RequiredRole::MunicipalityOwner,
            &format!("{} this payment", action.as_str()),
        )?;

        let next = payment.status.apply(action).map_err(|err| {
            warn!(
                %payment_id,
                from = %payment.status,
                action = action.as_str(),
                "payments: invalid transition"
            );
            BookingError::from(err)
        })?;

        let observations = match action {
            PaymentAction::Confirm => None,
            PaymentAction::Reject => Some(tagged_observation(
                payment.observations.as_deref(),
                "Rejection reason",
                reason.as_deref(),
            )),
            PaymentAction::Refund => Some(tagged_observation(
                payment.observations.as_deref(),
                "Refund reason",
                reason.as_deref(),
            )),
        };

        let transition = PaymentTransition {
            expected: payment.status,
            next,
            at: Utc::now(),
            observations,
        };

        let updated = self
            .payment_repo
            .apply_transition(payment_id, transition)
            .await
            .map_err(storage_error("apply payment transition"))?
            .ok_or_else(|| {
                warn!(
                    %payment_id,
                    expected = %payment.status,
                    "payments: status changed concurrently"
                );
                BookingError::conflict("payment", payment_id)
            })?;

        info!(
            %payment_id,
            reservation_id = %reservation.id,
            from = %payment.status,
            to = %updated.status,
            "payments: status changed"
        );

        self.receipt(updated, &reservation).await
    }

    pub async fn get(&self, payment_id: Uuid, principal: &Principal) -> UseCaseResult<PaymentEntity> {
        let payment = self.load_payment(payment_id).await?;
        self.authorize_view(payment.reservation_id, principal, "view this payment")
            .await?;
        Ok(payment)
    }

    pub async fn get_by_code(
        &self,
        code: String,
        principal: &Principal,
    ) -> UseCaseResult<PaymentEntity> {
        let payment = self
            .payment_repo
            .find_by_code(code.clone())
            .await
            .map_err(storage_error("find payment by code"))?
            .ok_or_else(|| BookingError::not_found("payment", code))?;
        self.authorize_view(payment.reservation_id, principal, "view this payment")
            .await?;
        Ok(payment)
    }

    pub async fn list_by_reservation(
        &self,
        reservation_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<Vec<PaymentEntity>> {
        self.authorize_view(reservation_id, principal, "list this reservation's payments")
            .await?;
        self.payment_repo
            .list_by_reservation(reservation_id)
            .await
            .map_err(storage_error("list payments by reservation"))
    }

    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<Vec<PaymentEntity>> {
        authorize(
            self.access_policy.as_ref(),
            principal,
            Some(user_id),
            None,
            RequiredRole::ResourceOwner,
            "list this user's payments",
        )?;
        self.payment_repo
            .list_by_user(user_id)
            .await
            .map_err(storage_error("list payments by user"))
    }

    pub async fn list_by_municipality(
        &self,
        municipality_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<Vec<PaymentEntity>> {
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
            "list this municipality's payments",
        )?;
        self.payment_repo
            .list_by_municipality(municipality_id)
            .await
            .map_err(storage_error("list payments by municipality"))
    }

    pub async fn list_all(&self, principal: &Principal) -> UseCaseResult<Vec<PaymentEntity>> {
        authorize(
            self.access_policy.as_ref(),
            principal,
            None,
            None,
            RequiredRole::Administrator,
            "list all payments",
        )?;
        self.payment_repo
            .list_all()
            .await
            .map_err(storage_error("list all payments"))
    }

    pub async fn total_confirmed(
        &self,
        reservation_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<i64> {
        self.authorize_view(reservation_id, principal, "view this reservation's payments")
            .await?;
        self.sum_confirmed(reservation_id).await
    }

    pub async fn settlement(
        &self,
        reservation_id: Uuid,
        principal: &Principal,
    ) -> UseCaseResult<Settlement> {
        let reservation = self
            .authorize_view(reservation_id, principal, "view this reservation's payments")
            .await?;
        let total = self.sum_confirmed(reservation_id).await?;
        Ok(Settlement::new(
            reservation_id,
            reservation.net_amount_minor,
            total,
        ))
    }

    async fn receipt(
        &self,
        payment: PaymentEntity,
        reservation: &ReservationEntity,
    ) -> UseCaseResult<PaymentReceipt> {
        let total = self.sum_confirmed(reservation.id).await?;
        let settlement = Settlement::new(reservation.id, reservation.net_amount_minor, total);
        if settlement.balance_minor < 0 {
            warn!(
                reservation_id = %reservation.id,
                balance_minor = settlement.balance_minor,
                "payments: reservation is overpaid"
            );
        }
        Ok(PaymentReceipt {
            payment,
            settlement,
        })
    }

    async fn sum_confirmed(&self, reservation_id: Uuid) -> UseCaseResult<i64> {
        self.payment_repo
            .total_confirmed(reservation_id)
            .await
            .map_err(storage_error("sum confirmed payments"))
    }

    async fn load_payment(&self, payment_id: Uuid) -> UseCaseResult<PaymentEntity> {
        self.payment_repo
            .find_by_id(payment_id)
            .await
            .map_err(storage_error("load payment"))?
            .ok_or_else(|| {
                warn!(%payment_id, "payments: payment not found");
                BookingError::not_found("payment", payment_id)
            })
    }

    async fn load_reservation(&self, reservation_id: Uuid) -> UseCaseResult<ReservationEntity> {
        self.reservation_repo
            .find_by_id(reservation_id)
            .await
            .map_err(storage_error("load reservation"))?
            .ok_or_else(|| {
                warn!(%reservation_id, "payments: reservation not found");
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
        reservation_id: Uuid,
        principal: &Principal,
        action: &str,
    ) -> UseCaseResult<ReservationEntity> {
        let reservation = self.load_reservation(reservation_id).await?;
        let municipality_owner_id = self.municipality_owner_of_plan(reservation.plan_id).await?;
        authorize(
            self.access_policy.as_ref(),
            principal,
            Some(reservation.user_id),
            municipality_owner_id,
            RequiredRole::OwnerOrMunicipality,
            action,
        )?;
        Ok(reservation)
    }
}

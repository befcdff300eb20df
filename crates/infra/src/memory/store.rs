use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use domain::{
    entities::{
        payments::{NewPaymentEntity, PaymentEntity, PaymentTransition},
        plans::{NewPlanEntity, PlanEntity, PlanRemoval},
        reservations::{NewReservationEntity, ReservationEntity, ReservationTransition},
    },
    repositories::{
        errors::DuplicateCode, municipalities::MunicipalityRepository, payments::PaymentRepository,
        plans::PlanRepository, reservations::ReservationRepository,
    },
    value_objects::{
        admission::{Admission, AdmissionOutcome, evaluate_admission},
        enums::{payment_statuses::PaymentStatus, plan_statuses::PlanStatus},
    },
};

struct StoredPlan {
    plan: PlanEntity,
    removed_at: Option<DateTime<Utc>>,
}

impl StoredPlan {
    fn live(&self) -> Option<&PlanEntity> {
        self.removed_at.is_none().then_some(&self.plan)
    }
}

#[derive(Default)]
struct State {
    municipality_owners: HashMap<Uuid, Uuid>,
    plans: HashMap<Uuid, StoredPlan>,
    reservations: HashMap<Uuid, ReservationEntity>,
    payments: HashMap<Uuid, PaymentEntity>,
}

impl State {
    fn live_plan(&self, plan_id: Uuid) -> Option<&PlanEntity> {
        self.plans.get(&plan_id).and_then(StoredPlan::live)
    }

    fn committed_people(&self, plan_id: Uuid, start_date: NaiveDate) -> i64 {
        self.reservations
            .values()
            .filter(|r| r.plan_id == plan_id && r.start_date == start_date)
            .filter(|r| r.status.holds_capacity())
            .map(|r| i64::from(r.number_of_people))
            .sum()
    }

    fn reservations_where<F>(&self, keep: F) -> Vec<ReservationEntity>
    where
        F: Fn(&ReservationEntity) -> bool,
    {
        let mut found: Vec<ReservationEntity> = self
            .reservations
            .values()
            .filter(|&r| keep(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }

    fn payments_where<F>(&self, keep: F) -> Vec<PaymentEntity>
    where
        F: Fn(&PaymentEntity) -> bool,
    {
        let mut found: Vec<PaymentEntity> = self
            .payments
            .values()
            .filter(|&p| keep(p))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }

    fn reservation_in_municipality(&self, reservation_id: Uuid, municipality_id: Uuid) -> bool {
        self.reservations
            .get(&reservation_id)
            .and_then(|r| self.live_plan(r.plan_id))
            .is_some_and(|plan| plan.municipality_id == municipality_id)
    }
}

/// Process-local store behind a single mutex.
///
/// Every repository call takes the lock once, so admission and insertion,
/// and each compare-and-set transition, are atomic with respect to each
/// other. Cheap to clone; clones share the same state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    /// Registers a municipality and the user that owns it.
    pub fn add_municipality(&self, municipality_id: Uuid, owner_user_id: Uuid) -> Result<()> {
        self.state()?
            .municipality_owners
            .insert(municipality_id, owner_user_id);
        Ok(())
    }
}

#[async_trait]
impl MunicipalityRepository for InMemoryStore {
    async fn find_owner_id(&self, municipality_id: Uuid) -> Result<Option<Uuid>> {
        Ok(self.state()?.municipality_owners.get(&municipality_id).copied())
    }
}

#[async_trait]
impl PlanRepository for InMemoryStore {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>> {
        Ok(self.state()?.live_plan(plan_id).cloned())
    }

    async fn find_municipality_owner(&self, plan_id: Uuid) -> Result<Option<Uuid>> {
        let state = self.state()?;
        Ok(state.plans.get(&plan_id).and_then(|stored| {
            state
                .municipality_owners
                .get(&stored.plan.municipality_id)
                .copied()
        }))
    }

    async fn insert(&self, plan: NewPlanEntity) -> Result<PlanEntity> {
        let mut state = self.state()?;
        let owner_id = state
            .municipality_owners
            .get(&plan.municipality_id)
            .copied()
            .ok_or_else(|| anyhow!("municipality {} does not exist", plan.municipality_id))?;
        if state.plans.contains_key(&plan.id) {
            bail!("plan {} already exists", plan.id);
        }

        let entity = PlanEntity {
            id: plan.id,
            municipality_id: plan.municipality_id,
            municipality_owner_id: owner_id,
            name: plan.name,
            price_minor: plan.price_minor,
            duration_days: plan.duration_days,
            maximum_capacity: plan.maximum_capacity,
            status: plan.status,
            created_by: plan.created_by,
            created_at: plan.created_at,
            updated_at: plan.created_at,
        };
        state.plans.insert(
            entity.id,
            StoredPlan {
                plan: entity.clone(),
                removed_at: None,
            },
        );
        Ok(entity)
    }

    async fn update_status(
        &self,
        plan_id: Uuid,
        status: PlanStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<PlanEntity>> {
        let mut state = self.state()?;
        let Some(stored) = state
            .plans
            .get_mut(&plan_id)
            .filter(|stored| stored.removed_at.is_none())
        else {
            return Ok(None);
        };

        stored.plan.status = status;
        stored.plan.updated_at = updated_at;
        Ok(Some(stored.plan.clone()))
    }

    async fn remove_if_unreserved(
        &self,
        plan_id: Uuid,
        removed_at: DateTime<Utc>,
    ) -> Result<PlanRemoval> {
        let mut state = self.state()?;
        if state.live_plan(plan_id).is_none() {
            return Ok(PlanRemoval::NotFound);
        }

        let open = state
            .reservations
            .values()
            .filter(|r| r.plan_id == plan_id && r.status.is_open())
            .count() as i64;
        if open > 0 {
            return Ok(PlanRemoval::HasOpenReservations(open));
        }

        if let Some(stored) = state.plans.get_mut(&plan_id) {
            stored.removed_at = Some(removed_at);
            stored.plan.updated_at = removed_at;
        }
        Ok(PlanRemoval::Removed)
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn committed_people(&self, plan_id: Uuid, start_date: NaiveDate) -> Result<i64> {
        Ok(self.state()?.committed_people(plan_id, start_date))
    }

    async fn insert_admitted(
        &self,
        reservation: NewReservationEntity,
        booked_at: DateTime<Utc>,
    ) -> Result<AdmissionOutcome> {
        let mut state = self.state()?;
        let Some(plan) = state.live_plan(reservation.plan_id) else {
            return Ok(AdmissionOutcome::PlanNotFound);
        };

        let committed = state.committed_people(plan.id, reservation.start_date);
        let admission = evaluate_admission(
            plan,
            committed,
            reservation.start_date,
            i64::from(reservation.number_of_people),
            booked_at,
        );
        debug!(
            plan_id = %plan.id,
            start_date = %reservation.start_date,
            committed,
            ?admission,
            "memory: admission under store lock"
        );
        if let Admission::Rejected(rejections) = admission {
            return Ok(AdmissionOutcome::Rejected(rejections));
        }

        if state.reservations.values().any(|r| r.code == reservation.code) {
            return Err(DuplicateCode {
                entity: "reservation",
                code: reservation.code,
            }
            .into());
        }

        let entity = reservation.into_entity();
        state.reservations.insert(entity.id, entity.clone());
        Ok(AdmissionOutcome::Admitted(entity))
    }

    async fn find_by_id(&self, reservation_id: Uuid) -> Result<Option<ReservationEntity>> {
        Ok(self.state()?.reservations.get(&reservation_id).cloned())
    }

    async fn find_by_code(&self, code: String) -> Result<Option<ReservationEntity>> {
        Ok(self
            .state()?
            .reservations
            .values()
            .find(|r| r.code == code)
            .cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<ReservationEntity>> {
        Ok(self.state()?.reservations_where(|r| r.user_id == user_id))
    }

    async fn list_by_plan(&self, plan_id: Uuid) -> Result<Vec<ReservationEntity>> {
        let mut found = self.state()?.reservations_where(|r| r.plan_id == plan_id);
        found.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(found)
    }

    async fn list_by_municipality(&self, municipality_id: Uuid) -> Result<Vec<ReservationEntity>> {
        let state = self.state()?;
        Ok(state.reservations_where(|r| state.reservation_in_municipality(r.id, municipality_id)))
    }

    async fn apply_transition(
        &self,
        reservation_id: Uuid,
        transition: ReservationTransition,
    ) -> Result<Option<ReservationEntity>> {
        let mut state = self.state()?;
        let Some(reservation) = state
            .reservations
            .get_mut(&reservation_id)
            .filter(|r| r.status == transition.expected)
        else {
            return Ok(None);
        };

        reservation.apply_transition(&transition);
        Ok(Some(reservation.clone()))
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn insert(&self, payment: NewPaymentEntity) -> Result<PaymentEntity> {
        let mut state = self.state()?;
        if !state.reservations.contains_key(&payment.reservation_id) {
            bail!("reservation {} does not exist", payment.reservation_id);
        }
        if state.payments.values().any(|p| p.code == payment.code) {
            return Err(DuplicateCode {
                entity: "payment",
                code: payment.code,
            }
            .into());
        }

        let entity = payment.into_entity();
        state.payments.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentEntity>> {
        Ok(self.state()?.payments.get(&payment_id).cloned())
    }

    async fn find_by_code(&self, code: String) -> Result<Option<PaymentEntity>> {
        Ok(self
            .state()?
            .payments
            .values()
            .find(|p| p.code == code)
            .cloned())
    }

    async fn list_by_reservation(&self, reservation_id: Uuid) -> Result<Vec<PaymentEntity>> {
        let mut found = self
            .state()?
            .payments_where(|p| p.reservation_id == reservation_id);
        found.reverse();
        Ok(found)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<PaymentEntity>> {
        let state = self.state()?;
        Ok(state.payments_where(|p| {
            state
                .reservations
                .get(&p.reservation_id)
                .is_some_and(|r| r.user_id == user_id)
        }))
    }

    async fn list_by_municipality(&self, municipality_id: Uuid) -> Result<Vec<PaymentEntity>> {
        let state = self.state()?;
        Ok(state.payments_where(|p| {
            state.reservation_in_municipality(p.reservation_id, municipality_id)
        }))
    }

    async fn list_all(&self) -> Result<Vec<PaymentEntity>> {
        Ok(self.state()?.payments_where(|_| true))
    }

    async fn total_confirmed(&self, reservation_id: Uuid) -> Result<i64> {
        Ok(self
            .state()?
            .payments
            .values()
            .filter(|p| p.reservation_id == reservation_id && p.status == PaymentStatus::Confirmed)
            .map(|p| p.amount_minor)
            .sum())
    }

    async fn apply_transition(
        &self,
        payment_id: Uuid,
        transition: PaymentTransition,
    ) -> Result<Option<PaymentEntity>> {
        let mut state = self.state()?;
        let Some(payment) = state
            .payments
            .get_mut(&payment_id)
            .filter(|p| p.status == transition.expected)
        else {
            return Ok(None);
        };

        payment.apply_transition(&transition);
        Ok(Some(payment.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::value_objects::enums::{
        payment_methods::PaymentMethod, payment_types::PaymentType,
        reservation_statuses::ReservationStatus,
    };

    async fn seeded_plan(store: &InMemoryStore, maximum_capacity: i32) -> PlanEntity {
        let municipality_id = Uuid::new_v4();
        store
            .add_municipality(municipality_id, Uuid::new_v4())
            .unwrap();
        PlanRepository::insert(
            store,
            NewPlanEntity {
                id: Uuid::new_v4(),
                municipality_id,
                name: "Cañón del Colca".to_string(),
                price_minor: 20_000,
                duration_days: 3,
                maximum_capacity,
                status: PlanStatus::Active,
                created_by: Uuid::new_v4(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap()
    }

    fn new_reservation(plan: &PlanEntity, people: i32, start_date: NaiveDate) -> NewReservationEntity {
        let gross = plan.price_minor * i64::from(people);
        NewReservationEntity {
            id: Uuid::new_v4(),
            code: format!("RES-TEST-{}", Uuid::new_v4().simple()),
            plan_id: plan.id,
            user_id: Uuid::new_v4(),
            start_date,
            end_date: start_date + Duration::days(i64::from(plan.duration_days)),
            number_of_people: people,
            gross_amount_minor: gross,
            discount_amount_minor: 0,
            net_amount_minor: gross,
            payment_method: PaymentMethod::Cash,
            observations: None,
            emergency_contact: None,
            emergency_phone: None,
            created_at: Utc::now(),
        }
    }

    fn start_date() -> NaiveDate {
        Utc::now().date_naive() + Duration::days(10)
    }

    #[tokio::test]
    async fn insert_admitted_refuses_what_does_not_fit() {
        let store = InMemoryStore::new();
        let plan = seeded_plan(&store, 3).await;
        let date = start_date();

        let first = store
            .insert_admitted(new_reservation(&plan, 2, date), Utc::now())
            .await
            .unwrap();
        assert!(matches!(first, AdmissionOutcome::Admitted(_)));

        let second = store
            .insert_admitted(new_reservation(&plan, 2, date), Utc::now())
            .await
            .unwrap();
        assert!(matches!(second, AdmissionOutcome::Rejected(_)));

        // Another date has its own pool.
        let other_day = store
            .insert_admitted(new_reservation(&plan, 3, date + Duration::days(1)), Utc::now())
            .await
            .unwrap();
        assert!(matches!(other_day, AdmissionOutcome::Admitted(_)));

        assert_eq!(store.committed_people(plan.id, date).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn transition_is_compare_and_set() {
        let store = InMemoryStore::new();
        let plan = seeded_plan(&store, 5).await;
        let AdmissionOutcome::Admitted(reservation) = store
            .insert_admitted(new_reservation(&plan, 1, start_date()), Utc::now())
            .await
            .unwrap()
        else {
            panic!("reservation was not admitted");
        };

        let confirm = ReservationTransition {
            expected: ReservationStatus::Pending,
            next: ReservationStatus::Confirmed,
            at: Utc::now(),
            cancellation_reason: None,
        };

        let first = ReservationRepository::apply_transition(&store, reservation.id, confirm.clone())
            .await
            .unwrap();
        assert_eq!(first.map(|r| r.status), Some(ReservationStatus::Confirmed));

        let second = ReservationRepository::apply_transition(&store, reservation.id, confirm)
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn removed_plan_disappears_from_lookups() {
        let store = InMemoryStore::new();
        let plan = seeded_plan(&store, 5).await;

        let removal = store.remove_if_unreserved(plan.id, Utc::now()).await.unwrap();
        assert_eq!(removal, PlanRemoval::Removed);
        assert!(PlanRepository::find_by_id(&store, plan.id).await.unwrap().is_none());
        assert_eq!(
            store.find_municipality_owner(plan.id).await.unwrap(),
            Some(plan.municipality_owner_id)
        );
        assert!(store.find_municipality_owner(Uuid::new_v4()).await.unwrap().is_none());

        let outcome = store
            .insert_admitted(new_reservation(&plan, 1, start_date()), Utc::now())
            .await
            .unwrap();
        assert!(matches!(outcome, AdmissionOutcome::PlanNotFound));
    }

    #[tokio::test]
    async fn taken_reservation_code_is_a_duplicate() {
        let store = InMemoryStore::new();
        let plan = seeded_plan(&store, 5).await;
        let first = new_reservation(&plan, 1, start_date());
        let mut second = new_reservation(&plan, 1, start_date());
        second.code = first.code.clone();

        store.insert_admitted(first.clone(), Utc::now()).await.unwrap();
        let err = store
            .insert_admitted(second, Utc::now())
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<DuplicateCode>(),
            Some(&DuplicateCode {
                entity: "reservation",
                code: first.code,
            })
        );
        assert_eq!(store.committed_people(plan.id, start_date()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn total_confirmed_counts_only_confirmed_payments() {
        let store = InMemoryStore::new();
        let plan = seeded_plan(&store, 5).await;
        let AdmissionOutcome::Admitted(reservation) = store
            .insert_admitted(new_reservation(&plan, 2, start_date()), Utc::now())
            .await
            .unwrap()
        else {
            panic!("reservation was not admitted");
        };

        let mut payment_ids = Vec::new();
        for amount_minor in [10_000, 5_000, 7_000] {
            let payment = PaymentRepository::insert(
                &store,
                NewPaymentEntity {
                    id: Uuid::new_v4(),
                    code: format!("PAY-TEST-{amount_minor}"),
                    reservation_id: reservation.id,
                    amount_minor,
                    payment_type: PaymentType::Partial,
                    method: PaymentMethod::Transfer,
                    transaction_ref: None,
                    authorization_ref: None,
                    observations: None,
                    created_at: Utc::now(),
                },
            )
            .await
            .unwrap();
            payment_ids.push(payment.id);
        }

        for (payment_id, next) in [
            (payment_ids[0], PaymentStatus::Confirmed),
            (payment_ids[1], PaymentStatus::Rejected),
        ] {
            let transition = PaymentTransition {
                expected: PaymentStatus::Pending,
                next,
                at: Utc::now(),
                observations: None,
            };
            PaymentRepository::apply_transition(&store, payment_id, transition)
                .await
                .unwrap()
                .unwrap();
        }

        assert_eq!(store.total_confirmed(reservation.id).await.unwrap(), 10_000);
    }
}

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use domain::{
    entities::plans::PlanEntity,
    repositories::{plans::PlanRepository, reservations::ReservationRepository},
    value_objects::admission::{Admission, Availability, evaluate_admission},
};
use tracing::{debug, error};
use uuid::Uuid;

use super::errors::{BookingError, UseCaseResult};

/// Answers "can N more people be booked into plan P on date D?".
///
/// Reads only. The authoritative check is repeated by the store inside the
/// same atomic unit that inserts the reservation.
pub struct CapacityLedger<P, R>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    reservation_repo: Arc<R>,
}

impl<P, R> CapacityLedger<P, R>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, reservation_repo: Arc<R>) -> Self {
        Self {
            plan_repo,
            reservation_repo,
        }
    }

    pub async fn committed_people(&self, plan_id: Uuid, start_date: NaiveDate) -> UseCaseResult<i64> {
        self.reservation_repo
            .committed_people(plan_id, start_date)
            .await
            .map_err(|err| {
                error!(
                    %plan_id,
                    %start_date,
                    db_error = ?err,
                    "capacity_ledger: failed to sum committed people"
                );
                BookingError::Internal(err)
            })
    }

    pub async fn admit(
        &self,
        plan_id: Uuid,
        start_date: NaiveDate,
        requested_people: i32,
        booked_at: DateTime<Utc>,
    ) -> UseCaseResult<Admission> {
        let plan = self.load_plan(plan_id).await?.ok_or_else(|| {
            BookingError::PlanUnavailable(format!("plan {plan_id} does not exist"))
        })?;
        self.admit_plan(&plan, start_date, requested_people, booked_at)
            .await
    }

    pub(crate) async fn admit_plan(
        &self,
        plan: &PlanEntity,
        start_date: NaiveDate,
        requested_people: i32,
        booked_at: DateTime<Utc>,
    ) -> UseCaseResult<Admission> {
        let committed = self.committed_people(plan.id, start_date).await?;
        let admission = evaluate_admission(
            plan,
            committed,
            start_date,
            i64::from(requested_people),
            booked_at,
        );

        debug!(
            plan_id = %plan.id,
            %start_date,
            committed,
            requested_people,
            maximum = plan.maximum_capacity,
            allowed = admission.is_allowed(),
            "capacity_ledger: admission evaluated"
        );

        Ok(admission)
    }

    pub async fn availability(&self, plan_id: Uuid, start_date: NaiveDate) -> UseCaseResult<Availability> {
        let plan = self
            .load_plan(plan_id)
            .await?
            .ok_or_else(|| BookingError::not_found("plan", plan_id))?;
        let committed = self.committed_people(plan_id, start_date).await?;
        Ok(Availability::new(i64::from(plan.maximum_capacity), committed))
    }

    async fn load_plan(&self, plan_id: Uuid) -> UseCaseResult<Option<PlanEntity>> {
        self.plan_repo.find_by_id(plan_id).await.map_err(|err| {
            error!(%plan_id, db_error = ?err, "capacity_ledger: failed to load plan");
            BookingError::Internal(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::{
        repositories::{plans::MockPlanRepository, reservations::MockReservationRepository},
        value_objects::{admission::AdmissionRejection, enums::plan_statuses::PlanStatus},
    };
    use mockall::predicate::eq;

    fn sample_plan(id: Uuid, maximum_capacity: i32) -> PlanEntity {
        PlanEntity {
            id,
            municipality_id: Uuid::new_v4(),
            municipality_owner_id: Uuid::new_v4(),
            name: "Llachon homestay".to_string(),
            price_minor: 14_000,
            duration_days: 2,
            maximum_capacity,
            status: PlanStatus::Active,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ledger_with(
        plan: Option<PlanEntity>,
        committed: i64,
    ) -> CapacityLedger<MockPlanRepository, MockReservationRepository> {
        let mut plan_repo = MockPlanRepository::new();
        let mut reservation_repo = MockReservationRepository::new();

        plan_repo.expect_find_by_id().returning(move |_| {
            let plan = plan.clone();
            Box::pin(async move { Ok(plan) })
        });
        reservation_repo
            .expect_committed_people()
            .returning(move |_, _| Box::pin(async move { Ok(committed) }));

        CapacityLedger::new(Arc::new(plan_repo), Arc::new(reservation_repo))
    }

    #[tokio::test]
    async fn admits_up_to_the_last_seat() {
        let plan_id = Uuid::new_v4();
        let ledger = ledger_with(Some(sample_plan(plan_id, 10)), 8);
        let date = Utc::now().date_naive() + Duration::days(5);

        let admission = ledger.admit(plan_id, date, 2, Utc::now()).await.unwrap();

        assert_eq!(
            admission,
            Admission::Allowed {
                committed: 8,
                remaining: 0
            }
        );
    }

    #[tokio::test]
    async fn rejects_one_person_over_capacity() {
        let plan_id = Uuid::new_v4();
        let ledger = ledger_with(Some(sample_plan(plan_id, 10)), 10);
        let date = Utc::now().date_naive() + Duration::days(5);

        let admission = ledger.admit(plan_id, date, 1, Utc::now()).await.unwrap();

        assert_eq!(
            admission,
            Admission::Rejected(vec![AdmissionRejection::CapacityExceeded {
                committed: 10,
                requested: 1,
                maximum: 10
            }])
        );
    }

    #[tokio::test]
    async fn missing_plan_is_unavailable() {
        let ledger = ledger_with(None, 0);
        let date = Utc::now().date_naive() + Duration::days(5);

        let err = ledger
            .admit(Uuid::new_v4(), date, 1, Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::PlanUnavailable(_)));
    }

    #[tokio::test]
    async fn availability_reports_remaining_seats() {
        let plan_id = Uuid::new_v4();
        let date = Utc::now().date_naive() + Duration::days(3);

        let mut plan_repo = MockPlanRepository::new();
        let mut reservation_repo = MockReservationRepository::new();
        let plan = sample_plan(plan_id, 12);
        plan_repo
            .expect_find_by_id()
            .with(eq(plan_id))
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });
        reservation_repo
            .expect_committed_people()
            .with(eq(plan_id), eq(date))
            .returning(|_, _| Box::pin(async { Ok(5) }));

        let ledger = CapacityLedger::new(Arc::new(plan_repo), Arc::new(reservation_repo));
        let availability = ledger.availability(plan_id, date).await.unwrap();

        assert_eq!(availability, Availability::new(12, 5));
        assert_eq!(availability.remaining, 7);
    }

    #[tokio::test]
    async fn storage_failure_is_internal() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("connection reset")) }));
        let ledger = CapacityLedger::new(
            Arc::new(plan_repo),
            Arc::new(MockReservationRepository::new()),
        );

        let err = ledger
            .availability(Uuid::new_v4(), Utc::now().date_naive())
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::Internal(_)));
    }
}

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::{dsl::sum, insert_into, prelude::*, update};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::postgres::{
    code_violation, postgres_connection::PgPoolSquad, repositories::plans::lock_plan,
};
use domain::{
    entities::reservations::{
        InsertReservationRow, NewReservationEntity, ReservationEntity, ReservationRow,
        ReservationTransition, ReservationTransitionChangeset,
    },
    repositories::reservations::ReservationRepository,
    schema::{plans, reservations},
    value_objects::{
        admission::{Admission, AdmissionOutcome, evaluate_admission},
        enums::reservation_statuses::ReservationStatus,
    },
};

pub struct ReservationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ReservationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn holding_statuses() -> Vec<&'static str> {
    ReservationStatus::HOLDING_CAPACITY
        .iter()
        .map(ReservationStatus::as_str)
        .collect()
}

fn committed_people_on(
    conn: &mut PgConnection,
    plan_id: Uuid,
    start_date: NaiveDate,
) -> QueryResult<i64> {
    let total = reservations::table
        .filter(reservations::plan_id.eq(plan_id))
        .filter(reservations::start_date.eq(start_date))
        .filter(reservations::status.eq_any(holding_statuses()))
        .select(sum(reservations::number_of_people))
        .first::<Option<i64>>(conn)?;

    Ok(total.unwrap_or(0))
}

fn into_entities(rows: Vec<ReservationRow>) -> Result<Vec<ReservationEntity>> {
    rows.into_iter().map(ReservationEntity::try_from).collect()
}

#[async_trait]
impl ReservationRepository for ReservationPostgres {
    async fn committed_people(&self, plan_id: Uuid, start_date: NaiveDate) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        Ok(committed_people_on(&mut conn, plan_id, start_date)?)
    }

    async fn insert_admitted(
        &self,
        reservation: NewReservationEntity,
        booked_at: DateTime<Utc>,
    ) -> Result<AdmissionOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        conn.transaction::<AdmissionOutcome, anyhow::Error, _>(|tx| {
            let Some(plan) = lock_plan(tx, reservation.plan_id)? else {
                return Ok(AdmissionOutcome::PlanNotFound);
            };

            let committed = committed_people_on(tx, plan.id, reservation.start_date)?;
            let admission = evaluate_admission(
                &plan,
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
                "reservations: admission under plan lock"
            );

            if let Admission::Rejected(rejections) = admission {
                return Ok(AdmissionOutcome::Rejected(rejections));
            }

            let row = insert_into(reservations::table)
                .values(&InsertReservationRow::from(&reservation))
                .returning(ReservationRow::as_select())
                .get_result::<ReservationRow>(tx)
                .map_err(|err| code_violation(err, "reservation", &reservation.code))?;

            Ok(AdmissionOutcome::Admitted(ReservationEntity::try_from(row)?))
        })
    }

    async fn find_by_id(&self, reservation_id: Uuid) -> Result<Option<ReservationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = reservations::table
            .find(reservation_id)
            .select(ReservationRow::as_select())
            .first::<ReservationRow>(&mut conn)
            .optional()?;

        row.map(ReservationEntity::try_from).transpose()
    }

    async fn find_by_code(&self, code: String) -> Result<Option<ReservationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = reservations::table
            .filter(reservations::code.eq(code))
            .select(ReservationRow::as_select())
            .first::<ReservationRow>(&mut conn)
            .optional()?;

        row.map(ReservationEntity::try_from).transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<ReservationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = reservations::table
            .filter(reservations::user_id.eq(user_id))
            .order(reservations::created_at.desc())
            .select(ReservationRow::as_select())
            .load::<ReservationRow>(&mut conn)?;

        into_entities(rows)
    }

    async fn list_by_plan(&self, plan_id: Uuid) -> Result<Vec<ReservationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = reservations::table
            .filter(reservations::plan_id.eq(plan_id))
            .order((reservations::start_date.asc(), reservations::created_at.asc()))
            .select(ReservationRow::as_select())
            .load::<ReservationRow>(&mut conn)?;

        into_entities(rows)
    }

    async fn list_by_municipality(&self, municipality_id: Uuid) -> Result<Vec<ReservationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = reservations::table
            .inner_join(plans::table)
            .filter(plans::municipality_id.eq(municipality_id))
            .filter(plans::removed_at.is_null())
            .order(reservations::created_at.desc())
            .select(ReservationRow::as_select())
            .load::<ReservationRow>(&mut conn)?;

        into_entities(rows)
    }

    async fn apply_transition(
        &self,
        reservation_id: Uuid,
        transition: ReservationTransition,
    ) -> Result<Option<ReservationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = update(
            reservations::table
                .filter(reservations::id.eq(reservation_id))
                .filter(reservations::status.eq(transition.expected.as_str())),
        )
        .set(&ReservationTransitionChangeset::from(&transition))
        .returning(ReservationRow::as_select())
        .get_result::<ReservationRow>(&mut conn)
        .optional()?;

        row.map(ReservationEntity::try_from).transpose()
    }
}

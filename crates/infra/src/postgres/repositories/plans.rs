use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::postgres::postgres_connection::PgPoolSquad;
use domain::{
    entities::plans::{InsertPlanRow, NewPlanEntity, PlanEntity, PlanRemoval, PlanRow},
    repositories::plans::PlanRepository,
    schema::{municipalities, plans, reservations},
    value_objects::enums::{plan_statuses::PlanStatus, reservation_statuses::ReservationStatus},
};

pub struct PlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

pub(crate) fn municipality_owner(conn: &mut PgConnection, municipality_id: Uuid) -> QueryResult<Uuid> {
    municipalities::table
        .find(municipality_id)
        .select(municipalities::owner_user_id)
        .first::<Uuid>(conn)
}

/// Locks the plan row for the rest of the transaction. Every booking and the
/// soft removal of a plan go through this lock.
pub(crate) fn lock_plan(conn: &mut PgConnection, plan_id: Uuid) -> QueryResult<Option<PlanEntity>> {
    let row = plans::table
        .filter(plans::id.eq(plan_id))
        .filter(plans::removed_at.is_null())
        .select(PlanRow::as_select())
        .for_update()
        .first::<PlanRow>(conn)
        .optional()?;

    match row {
        Some(row) => {
            let owner_id = municipality_owner(conn, row.municipality_id)?;
            Ok(Some(PlanEntity::from_row(row, owner_id)))
        }
        None => Ok(None),
    }
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = plans::table
            .inner_join(municipalities::table)
            .filter(plans::id.eq(plan_id))
            .filter(plans::removed_at.is_null())
            .select((PlanRow::as_select(), municipalities::owner_user_id))
            .first::<(PlanRow, Uuid)>(&mut conn)
            .optional()?;

        Ok(row.map(|(row, owner_id)| PlanEntity::from_row(row, owner_id)))
    }

    async fn find_municipality_owner(&self, plan_id: Uuid) -> Result<Option<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let owner_id = plans::table
            .inner_join(municipalities::table)
            .filter(plans::id.eq(plan_id))
            .select(municipalities::owner_user_id)
            .first::<Uuid>(&mut conn)
            .optional()?;

        Ok(owner_id)
    }

    async fn insert(&self, plan: NewPlanEntity) -> Result<PlanEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let entity = conn.transaction::<PlanEntity, diesel::result::Error, _>(|tx| {
            let owner_id = municipality_owner(tx, plan.municipality_id)?;
            let row = insert_into(plans::table)
                .values(&InsertPlanRow::from(&plan))
                .returning(PlanRow::as_select())
                .get_result::<PlanRow>(tx)?;
            Ok(PlanEntity::from_row(row, owner_id))
        })?;

        Ok(entity)
    }

    async fn update_status(
        &self,
        plan_id: Uuid,
        status: PlanStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let entity = conn.transaction::<Option<PlanEntity>, diesel::result::Error, _>(|tx| {
            let row = update(
                plans::table
                    .filter(plans::id.eq(plan_id))
                    .filter(plans::removed_at.is_null()),
            )
            .set((
                plans::status.eq(status.as_str()),
                plans::updated_at.eq(updated_at),
            ))
            .returning(PlanRow::as_select())
            .get_result::<PlanRow>(tx)
            .optional()?;

            match row {
                Some(row) => {
                    let owner_id = municipality_owner(tx, row.municipality_id)?;
                    Ok(Some(PlanEntity::from_row(row, owner_id)))
                }
                None => Ok(None),
            }
        })?;

        Ok(entity)
    }

    async fn remove_if_unreserved(
        &self,
        plan_id: Uuid,
        removed_at: DateTime<Utc>,
    ) -> Result<PlanRemoval> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let open_statuses: Vec<&'static str> = ReservationStatus::OPEN
            .iter()
            .map(ReservationStatus::as_str)
            .collect();

        let removal = conn.transaction::<PlanRemoval, diesel::result::Error, _>(|tx| {
            if lock_plan(tx, plan_id)?.is_none() {
                return Ok(PlanRemoval::NotFound);
            }

            let open = reservations::table
                .filter(reservations::plan_id.eq(plan_id))
                .filter(reservations::status.eq_any(open_statuses))
                .count()
                .get_result::<i64>(tx)?;
            if open > 0 {
                return Ok(PlanRemoval::HasOpenReservations(open));
            }

            update(plans::table.find(plan_id))
                .set((
                    plans::removed_at.eq(Some(removed_at)),
                    plans::updated_at.eq(removed_at),
                ))
                .execute(tx)?;

            Ok(PlanRemoval::Removed)
        })?;

        Ok(removal)
    }
}

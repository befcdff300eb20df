use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::postgres::{code_violation, postgres_connection::PgPoolSquad};
use domain::{
    entities::payments::{
        InsertPaymentRow, NewPaymentEntity, PaymentEntity, PaymentRow, PaymentTransition,
        PaymentTransitionChangeset,
    },
    repositories::payments::PaymentRepository,
    schema::{payments, plans, reservations},
    value_objects::enums::payment_statuses::PaymentStatus,
};

pub struct PaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn into_entities(rows: Vec<PaymentRow>) -> Result<Vec<PaymentEntity>> {
    rows.into_iter().map(PaymentEntity::try_from).collect()
}

#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn insert(&self, payment: NewPaymentEntity) -> Result<PaymentEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = insert_into(payments::table)
            .values(&InsertPaymentRow::from(&payment))
            .returning(PaymentRow::as_select())
            .get_result::<PaymentRow>(&mut conn)
            .map_err(|err| code_violation(err, "payment", &payment.code))?;

        PaymentEntity::try_from(row)
    }

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = payments::table
            .find(payment_id)
            .select(PaymentRow::as_select())
            .first::<PaymentRow>(&mut conn)
            .optional()?;

        row.map(PaymentEntity::try_from).transpose()
    }

    async fn find_by_code(&self, code: String) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = payments::table
            .filter(payments::code.eq(code))
            .select(PaymentRow::as_select())
            .first::<PaymentRow>(&mut conn)
            .optional()?;

        row.map(PaymentEntity::try_from).transpose()
    }

    async fn list_by_reservation(&self, reservation_id: Uuid) -> Result<Vec<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = payments::table
            .filter(payments::reservation_id.eq(reservation_id))
            .order(payments::created_at.asc())
            .select(PaymentRow::as_select())
            .load::<PaymentRow>(&mut conn)?;

        into_entities(rows)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = payments::table
            .inner_join(reservations::table)
            .filter(reservations::user_id.eq(user_id))
            .order(payments::created_at.desc())
            .select(PaymentRow::as_select())
            .load::<PaymentRow>(&mut conn)?;

        into_entities(rows)
    }

    async fn list_by_municipality(&self, municipality_id: Uuid) -> Result<Vec<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = payments::table
            .inner_join(reservations::table.inner_join(plans::table))
            .filter(plans::municipality_id.eq(municipality_id))
            .filter(plans::removed_at.is_null())
            .order(payments::created_at.desc())
            .select(PaymentRow::as_select())
            .load::<PaymentRow>(&mut conn)?;

        into_entities(rows)
    }

    async fn list_all(&self) -> Result<Vec<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = payments::table
            .order(payments::created_at.desc())
            .select(PaymentRow::as_select())
            .load::<PaymentRow>(&mut conn)?;

        into_entities(rows)
    }

    async fn total_confirmed(&self, reservation_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // SUM over BIGINT is NUMERIC in Postgres; add the amounts here instead.
        let amounts = payments::table
            .filter(payments::reservation_id.eq(reservation_id))
            .filter(payments::status.eq(PaymentStatus::Confirmed.as_str()))
            .select(payments::amount_minor)
            .load::<i64>(&mut conn)?;

        Ok(amounts.into_iter().sum())
    }

    async fn apply_transition(
        &self,
        payment_id: Uuid,
        transition: PaymentTransition,
    ) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = update(
            payments::table
                .filter(payments::id.eq(payment_id))
                .filter(payments::status.eq(transition.expected.as_str())),
        )
        .set(&PaymentTransitionChangeset::from(&transition))
        .returning(PaymentRow::as_select())
        .get_result::<PaymentRow>(&mut conn)
        .optional()?;

        row.map(PaymentEntity::try_from).transpose()
    }
}

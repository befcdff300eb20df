use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::postgres::postgres_connection::PgPoolSquad;
use domain::{repositories::municipalities::MunicipalityRepository, schema::municipalities};

pub struct MunicipalityPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MunicipalityPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MunicipalityRepository for MunicipalityPostgres {
    async fn find_owner_id(&self, municipality_id: Uuid) -> Result<Option<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let owner_id = municipalities::table
            .find(municipality_id)
            .select(municipalities::owner_user_id)
            .first::<Uuid>(&mut conn)
            .optional()?;

        Ok(owner_id)
    }
}

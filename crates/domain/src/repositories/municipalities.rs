use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

#[async_trait]
#[automock]
pub trait MunicipalityRepository {
    /// The user that administers the municipality, if it exists.
    async fn find_owner_id(&self, municipality_id: Uuid) -> Result<Option<Uuid>>;
}

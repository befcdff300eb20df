use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::payments::{NewPaymentEntity, PaymentEntity, PaymentTransition};

#[async_trait]
#[automock]
pub trait PaymentRepository {
    async fn insert(&self, payment: NewPaymentEntity) -> Result<PaymentEntity>;

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentEntity>>;

    async fn find_by_code(&self, code: String) -> Result<Option<PaymentEntity>>;

    async fn list_by_reservation(&self, reservation_id: Uuid) -> Result<Vec<PaymentEntity>>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<PaymentEntity>>;

    async fn list_by_municipality(&self, municipality_id: Uuid) -> Result<Vec<PaymentEntity>>;

    async fn list_all(&self) -> Result<Vec<PaymentEntity>>;

    /// Sum of amounts of the reservation's CONFIRMED payments.
    async fn total_confirmed(&self, reservation_id: Uuid) -> Result<i64>;

    /// Compare-and-set on the payment status; `Ok(None)` when the stored
    /// status no longer equals `transition.expected`.
    async fn apply_transition(
        &self,
        payment_id: Uuid,
        transition: PaymentTransition,
    ) -> Result<Option<PaymentEntity>>;
}

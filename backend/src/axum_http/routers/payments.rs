use std::sync::Arc;

use application::usecases::{
    access_policy::{AccessPolicy, RoleAccessPolicy},
    payments::PaymentUseCase,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use domain::{
    repositories::{
        municipalities::MunicipalityRepository, payments::PaymentRepository,
        plans::PlanRepository, reservations::ReservationRepository,
    },
    value_objects::payments::{PaymentReasonModel, RegisterPaymentModel},
};
use infra::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{
        municipalities::MunicipalityPostgres, payments::PaymentPostgres, plans::PlanPostgres,
        reservations::ReservationPostgres,
    },
};
use serde_json::json;
use uuid::Uuid;

use crate::{auth::AuthUser, axum_http::error_responses::AppError};

type Usecase<P, R, Pay, M, A> = State<Arc<PaymentUseCase<P, R, Pay, M, A>>>;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let payments_usecase = PaymentUseCase::new(
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::new(ReservationPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PaymentPostgres::new(Arc::clone(&db_pool))),
        Arc::new(MunicipalityPostgres::new(Arc::clone(&db_pool))),
        Arc::new(RoleAccessPolicy),
    );

    router(Arc::new(payments_usecase))
}

pub fn router<P, R, Pay, M, A>(payments_usecase: Arc<PaymentUseCase<P, R, Pay, M, A>>) -> Router
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    Router::new()
        .route(
            "/",
            post(register::<P, R, Pay, M, A>).get(list_all::<P, R, Pay, M, A>),
        )
        .route("/code/:code", get(get_by_code::<P, R, Pay, M, A>))
        .route(
            "/reservations/:reservation_id",
            get(list_by_reservation::<P, R, Pay, M, A>),
        )
        .route(
            "/reservations/:reservation_id/total",
            get(total_confirmed::<P, R, Pay, M, A>),
        )
        .route(
            "/reservations/:reservation_id/settlement",
            get(settlement::<P, R, Pay, M, A>),
        )
        .route("/users/:user_id", get(list_by_user::<P, R, Pay, M, A>))
        .route(
            "/municipalities/:municipality_id",
            get(list_by_municipality::<P, R, Pay, M, A>),
        )
        .route("/:payment_id", get(get_payment::<P, R, Pay, M, A>))
        .route("/:payment_id/confirm", post(confirm::<P, R, Pay, M, A>))
        .route("/:payment_id/reject", post(reject::<P, R, Pay, M, A>))
        .route("/:payment_id/refund", post(refund::<P, R, Pay, M, A>))
        .with_state(payments_usecase)
}

pub async fn register<P, R, Pay, M, A>(
    State(payments_usecase): Usecase<P, R, Pay, M, A>,
    AuthUser(principal): AuthUser,
    Json(register_payment_model): Json<RegisterPaymentModel>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let receipt = payments_usecase
        .register(register_payment_model, &principal)
        .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn confirm<P, R, Pay, M, A>(
    State(payments_usecase): Usecase<P, R, Pay, M, A>,
    AuthUser(principal): AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let receipt = payments_usecase.confirm(payment_id, &principal).await?;
    Ok(Json(receipt))
}

pub async fn reject<P, R, Pay, M, A>(
    State(payments_usecase): Usecase<P, R, Pay, M, A>,
    AuthUser(principal): AuthUser,
    Path(payment_id): Path<Uuid>,
    Json(reason_model): Json<PaymentReasonModel>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let receipt = payments_usecase
        .reject(payment_id, reason_model.reason, &principal)
        .await?;
    Ok(Json(receipt))
}

pub async fn refund<P, R, Pay, M, A>(
    State(payments_usecase): Usecase<P, R, Pay, M, A>,
    AuthUser(principal): AuthUser,
    Path(payment_id): Path<Uuid>,
    Json(reason_model): Json<PaymentReasonModel>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let receipt = payments_usecase
        .refund(payment_id, reason_model.reason, &principal)
        .await?;
    Ok(Json(receipt))
}

pub async fn get_payment<P, R, Pay, M, A>(
    State(payments_usecase): Usecase<P, R, Pay, M, A>,
    AuthUser(principal): AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let payment = payments_usecase.get(payment_id, &principal).await?;
    Ok(Json(payment))
}

pub async fn get_by_code<P, R, Pay, M, A>(
    State(payments_usecase): Usecase<P, R, Pay, M, A>,
    AuthUser(principal): AuthUser,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let payment = payments_usecase.get_by_code(code, &principal).await?;
    Ok(Json(payment))
}

pub async fn list_by_reservation<P, R, Pay, M, A>(
    State(payments_usecase): Usecase<P, R, Pay, M, A>,
    AuthUser(principal): AuthUser,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let payments = payments_usecase
        .list_by_reservation(reservation_id, &principal)
        .await?;
    Ok(Json(payments))
}

pub async fn list_by_user<P, R, Pay, M, A>(
    State(payments_usecase): Usecase<P, R, Pay, M, A>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let payments = payments_usecase.list_by_user(user_id, &principal).await?;
    Ok(Json(payments))
}

pub async fn list_by_municipality<P, R, Pay, M, A>(
    State(payments_usecase): Usecase<P, R, Pay, M, A>,
    AuthUser(principal): AuthUser,
    Path(municipality_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let payments = payments_usecase
        .list_by_municipality(municipality_id, &principal)
        .await?;
    Ok(Json(payments))
}

pub async fn list_all<P, R, Pay, M, A>(
    State(payments_usecase): Usecase<P, R, Pay, M, A>,
    AuthUser(principal): AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let payments = payments_usecase.list_all(&principal).await?;
    Ok(Json(payments))
}

pub async fn total_confirmed<P, R, Pay, M, A>(
    State(payments_usecase): Usecase<P, R, Pay, M, A>,
    AuthUser(principal): AuthUser,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let total_confirmed_minor = payments_usecase
        .total_confirmed(reservation_id, &principal)
        .await?;

    Ok(Json(json!({
        "reservation_id": reservation_id,
        "total_confirmed_minor": total_confirmed_minor,
    })))
}

pub async fn settlement<P, R, Pay, M, A>(
    State(payments_usecase): Usecase<P, R, Pay, M, A>,
    AuthUser(principal): AuthUser,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let settlement = payments_usecase.settlement(reservation_id, &principal).await?;
    Ok(Json(settlement))
}

use std::sync::Arc;

use application::usecases::{
    access_policy::{AccessPolicy, RoleAccessPolicy},
    reservations::ReservationUseCase,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use domain::{
    repositories::{
        municipalities::MunicipalityRepository, plans::PlanRepository,
        reservations::ReservationRepository,
    },
    value_objects::reservations::{CancelReservationModel, CreateReservationModel},
};
use infra::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{
        municipalities::MunicipalityPostgres, plans::PlanPostgres,
        reservations::ReservationPostgres,
    },
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::AuthUser, axum_http::error_responses::AppError};

type Usecase<P, R, M, A> = State<Arc<ReservationUseCase<P, R, M, A>>>;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let reservations_usecase = ReservationUseCase::new(
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::new(ReservationPostgres::new(Arc::clone(&db_pool))),
        Arc::new(MunicipalityPostgres::new(Arc::clone(&db_pool))),
        Arc::new(RoleAccessPolicy),
    );

    router(Arc::new(reservations_usecase))
}

pub fn router<P, R, M, A>(reservations_usecase: Arc<ReservationUseCase<P, R, M, A>>) -> Router
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    Router::new()
        .route("/", post(create::<P, R, M, A>))
        .route("/availability", get(availability::<P, R, M, A>))
        .route("/code/:code", get(get_by_code::<P, R, M, A>))
        .route("/users/:user_id", get(list_by_user::<P, R, M, A>))
        .route("/plans/:plan_id", get(list_by_plan::<P, R, M, A>))
        .route(
            "/municipalities/:municipality_id",
            get(list_by_municipality::<P, R, M, A>),
        )
        .route("/:reservation_id", get(get_reservation::<P, R, M, A>))
        .route("/:reservation_id/confirm", post(confirm::<P, R, M, A>))
        .route("/:reservation_id/start", post(start::<P, R, M, A>))
        .route("/:reservation_id/complete", post(complete::<P, R, M, A>))
        .route("/:reservation_id/cancel", post(cancel::<P, R, M, A>))
        .with_state(reservations_usecase)
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub plan_id: Uuid,
    pub date: NaiveDate,
}

pub async fn create<P, R, M, A>(
    State(reservations_usecase): Usecase<P, R, M, A>,
    AuthUser(principal): AuthUser,
    Json(create_reservation_model): Json<CreateReservationModel>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let reservation = reservations_usecase
        .create(principal.user_id, create_reservation_model, &principal)
        .await?;

    Ok((StatusCode::CREATED, Json(reservation)))
}

pub async fn availability<P, R, M, A>(
    State(reservations_usecase): Usecase<P, R, M, A>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let availability = reservations_usecase
        .capacity()
        .availability(query.plan_id, query.date)
        .await?;

    Ok(Json(availability))
}

pub async fn get_reservation<P, R, M, A>(
    State(reservations_usecase): Usecase<P, R, M, A>,
    AuthUser(principal): AuthUser,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let reservation = reservations_usecase.get(reservation_id, &principal).await?;
    Ok(Json(reservation))
}

pub async fn get_by_code<P, R, M, A>(
    State(reservations_usecase): Usecase<P, R, M, A>,
    AuthUser(principal): AuthUser,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let reservation = reservations_usecase.get_by_code(code, &principal).await?;
    Ok(Json(reservation))
}

pub async fn list_by_user<P, R, M, A>(
    State(reservations_usecase): Usecase<P, R, M, A>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let reservations = reservations_usecase.list_by_user(user_id, &principal).await?;
    Ok(Json(reservations))
}

pub async fn list_by_plan<P, R, M, A>(
    State(reservations_usecase): Usecase<P, R, M, A>,
    AuthUser(principal): AuthUser,
    Path(plan_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let reservations = reservations_usecase.list_by_plan(plan_id, &principal).await?;
    Ok(Json(reservations))
}

pub async fn list_by_municipality<P, R, M, A>(
    State(reservations_usecase): Usecase<P, R, M, A>,
    AuthUser(principal): AuthUser,
    Path(municipality_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let reservations = reservations_usecase
        .list_by_municipality(municipality_id, &principal)
        .await?;
    Ok(Json(reservations))
}

pub async fn confirm<P, R, M, A>(
    State(reservations_usecase): Usecase<P, R, M, A>,
    AuthUser(principal): AuthUser,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let reservation = reservations_usecase.confirm(reservation_id, &principal).await?;
    Ok(Json(reservation))
}

pub async fn start<P, R, M, A>(
    State(reservations_usecase): Usecase<P, R, M, A>,
    AuthUser(principal): AuthUser,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let reservation = reservations_usecase.start(reservation_id, &principal).await?;
    Ok(Json(reservation))
}

pub async fn complete<P, R, M, A>(
    State(reservations_usecase): Usecase<P, R, M, A>,
    AuthUser(principal): AuthUser,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let reservation = reservations_usecase.complete(reservation_id, &principal).await?;
    Ok(Json(reservation))
}

pub async fn cancel<P, R, M, A>(
    State(reservations_usecase): Usecase<P, R, M, A>,
    AuthUser(principal): AuthUser,
    Path(reservation_id): Path<Uuid>,
    Json(cancel_model): Json<CancelReservationModel>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    R: ReservationRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let reservation = reservations_usecase
        .cancel(reservation_id, cancel_model.reason, &principal)
        .await?;
    Ok(Json(reservation))
}

use std::sync::Arc;

use application::usecases::{
    access_policy::{AccessPolicy, RoleAccessPolicy},
    plans::PlanUseCase,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use domain::{
    repositories::{municipalities::MunicipalityRepository, plans::PlanRepository},
    value_objects::plans::{ChangePlanStatusModel, CreatePlanModel},
};
use infra::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{municipalities::MunicipalityPostgres, plans::PlanPostgres},
};
use uuid::Uuid;

use crate::{auth::AuthUser, axum_http::error_responses::AppError};

type Usecase<P, M, A> = State<Arc<PlanUseCase<P, M, A>>>;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plans_usecase = PlanUseCase::new(
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::new(MunicipalityPostgres::new(Arc::clone(&db_pool))),
        Arc::new(RoleAccessPolicy),
    );

    router(Arc::new(plans_usecase))
}

pub fn router<P, M, A>(plans_usecase: Arc<PlanUseCase<P, M, A>>) -> Router
where
    P: PlanRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    Router::new()
        .route("/", post(create_plan::<P, M, A>))
        .route(
            "/:plan_id",
            get(get_plan::<P, M, A>).delete(remove_plan::<P, M, A>),
        )
        .route("/:plan_id/status", patch(change_status::<P, M, A>))
        .with_state(plans_usecase)
}

pub async fn create_plan<P, M, A>(
    State(plans_usecase): Usecase<P, M, A>,
    AuthUser(principal): AuthUser,
    Json(create_plan_model): Json<CreatePlanModel>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let plan = plans_usecase
        .create_plan(create_plan_model, &principal)
        .await?;

    Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn get_plan<P, M, A>(
    State(plans_usecase): Usecase<P, M, A>,
    Path(plan_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let plan = plans_usecase.get(plan_id).await?;
    Ok(Json(plan))
}

pub async fn change_status<P, M, A>(
    State(plans_usecase): Usecase<P, M, A>,
    AuthUser(principal): AuthUser,
    Path(plan_id): Path<Uuid>,
    Json(change_status_model): Json<ChangePlanStatusModel>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    let plan = plans_usecase
        .change_status(plan_id, change_status_model.status, &principal)
        .await?;
    Ok(Json(plan))
}

pub async fn remove_plan<P, M, A>(
    State(plans_usecase): Usecase<P, M, A>,
    AuthUser(principal): AuthUser,
    Path(plan_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    M: MunicipalityRepository + Send + Sync + 'static,
    A: AccessPolicy + 'static,
{
    plans_usecase.remove_plan(plan_id, &principal).await?;
    Ok(StatusCode::NO_CONTENT)
}

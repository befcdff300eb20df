use std::sync::Arc;

use application::usecases::{
    access_policy::RoleAccessPolicy, payments::PaymentUseCase, plans::PlanUseCase,
    reservations::ReservationUseCase,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use backend::{
    auth::{Claims, JwtVerifier},
    axum_http::{http_serve, routers},
};
use chrono::{Duration, Utc};
use infra::memory::InMemoryStore;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "route-tests-secret-with-enough-length";

struct Api {
    app: Router,
    municipality_id: Uuid,
    municipality_user: Uuid,
}

fn api() -> Api {
    let store = Arc::new(InMemoryStore::new());
    let policy = Arc::new(RoleAccessPolicy);
    let municipality_id = Uuid::new_v4();
    let municipality_user = Uuid::new_v4();
    store
        .add_municipality(municipality_id, municipality_user)
        .unwrap();

    let plans = PlanUseCase::new(Arc::clone(&store), Arc::clone(&store), Arc::clone(&policy));
    let reservations = ReservationUseCase::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&policy),
    );
    let payments = PaymentUseCase::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
        policy,
    );

    let app = http_serve::api(
        routers::plans::router(Arc::new(plans)),
        routers::reservations::router(Arc::new(reservations)),
        routers::payments::router(Arc::new(payments)),
        Arc::new(JwtVerifier::new(SECRET)),
    );

    Api {
        app,
        municipality_id,
        municipality_user,
    }
}

fn bearer(user_id: Uuid, roles: &[&str]) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        roles: roles.iter().map(|role| role.to_string()).collect(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, token);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_plan(api: &Api, municipality: &str, capacity: i32) -> String {
    let (status, plan) = call(
        &api.app,
        "POST",
        "/api/v1/plans",
        Some(municipality),
        Some(json!({
            "municipality_id": api.municipality_id,
            "name": "Llachon Homestay",
            "price_minor": 15000,
            "duration_days": 3,
            "maximum_capacity": capacity,
            "status": "ACTIVE",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    plan["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check_needs_no_token() {
    let api = api();
    let response = api
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health-check")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn booking_without_token_is_unauthorized() {
    let api = api();
    let (status, body) = call(
        &api.app,
        "POST",
        "/api/v1/reservations",
        None,
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);
}

#[tokio::test]
async fn booking_lifecycle_over_http() {
    let api = api();
    let municipality = bearer(api.municipality_user, &["ROLE_MUNICIPALITY"]);
    let tourist_id = Uuid::new_v4();
    let tourist = bearer(tourist_id, &["ROLE_USER"]);
    let plan_id = create_plan(&api, &municipality, 10).await;
    let start_date = (Utc::now() + Duration::days(20)).date_naive();

    let (status, reservation) = call(
        &api.app,
        "POST",
        "/api/v1/reservations",
        Some(&tourist),
        Some(json!({
            "plan_id": plan_id,
            "start_date": start_date,
            "number_of_people": 4,
            "discount_amount_minor": 2000,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reservation["status"], "PENDING");
    assert_eq!(reservation["gross_amount_minor"], 60000);
    assert_eq!(reservation["net_amount_minor"], 58000);
    let reservation_id = reservation["id"].as_str().unwrap().to_string();

    let (status, availability) = call(
        &api.app,
        "GET",
        &format!("/api/v1/reservations/availability?plan_id={plan_id}&date={start_date}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["remaining"], 6);

    let (status, _) = call(
        &api.app,
        "POST",
        &format!("/api/v1/reservations/{reservation_id}/confirm"),
        Some(&tourist),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, confirmed) = call(
        &api.app,
        "POST",
        &format!("/api/v1/reservations/{reservation_id}/confirm"),
        Some(&municipality),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "CONFIRMED");

    let (status, body) = call(
        &api.app,
        "POST",
        &format!("/api/v1/reservations/{reservation_id}/complete"),
        Some(&municipality),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);

    let (status, receipt) = call(
        &api.app,
        "POST",
        "/api/v1/payments",
        Some(&tourist),
        Some(json!({
            "reservation_id": reservation_id,
            "amount_minor": 58000,
            "payment_type": "FULL",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["payment"]["status"], "PENDING");
    let payment_id = receipt["payment"]["id"].as_str().unwrap().to_string();

    let (status, receipt) = call(
        &api.app,
        "POST",
        &format!("/api/v1/payments/{payment_id}/confirm"),
        Some(&municipality),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["settlement"]["fully_paid"], true);

    let (status, total) = call(
        &api.app,
        "GET",
        &format!("/api/v1/payments/reservations/{reservation_id}/total"),
        Some(&tourist),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(total["total_confirmed_minor"], 58000);
}

#[tokio::test]
async fn overbooking_is_a_conflict() {
    let api = api();
    let municipality = bearer(api.municipality_user, &["MUNICIPALITY"]);
    let tourist = bearer(Uuid::new_v4(), &["USER"]);
    let plan_id = create_plan(&api, &municipality, 3).await;
    let start_date = (Utc::now() + Duration::days(5)).date_naive();

    let (status, body) = call(
        &api.app,
        "POST",
        "/api/v1/reservations",
        Some(&tourist),
        Some(json!({
            "plan_id": plan_id,
            "start_date": start_date,
            "number_of_people": 4,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);
}

#[tokio::test]
async fn removing_plan_with_open_booking_is_refused() {
    let api = api();
    let municipality = bearer(api.municipality_user, &["MUNICIPALITY"]);
    let tourist = bearer(Uuid::new_v4(), &["USER"]);
    let plan_id = create_plan(&api, &municipality, 8).await;
    let start_date = (Utc::now() + Duration::days(9)).date_naive();

    let (status, _) = call(
        &api.app,
        "POST",
        "/api/v1/reservations",
        Some(&tourist),
        Some(json!({
            "plan_id": plan_id,
            "start_date": start_date,
            "number_of_people": 2,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(
        &api.app,
        "DELETE",
        &format!("/api/v1/plans/{plan_id}"),
        Some(&municipality),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_route_falls_back_to_not_found() {
    let api = api();
    let (status, body) = call(&api.app, "GET", "/api/v1/tours", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
    assert_eq!(body["message"], "no route for /api/v1/tours");
}

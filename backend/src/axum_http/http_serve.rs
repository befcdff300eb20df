use crate::{
    auth::JwtVerifier,
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use infra::postgres::postgres_connection::PgPoolSquad;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

/// Mounts the feature routers under `/api/v1` with the bearer verifier installed.
pub fn api(
    plans: Router,
    reservations: Router,
    payments: Router,
    jwt_verifier: Arc<JwtVerifier>,
) -> Router {
    Router::new()
        .fallback(default_routers::not_found)
        .nest("/api/v1/plans", plans)
        .nest("/api/v1/reservations", reservations)
        .nest("/api/v1/payments", payments)
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(jwt_verifier))
}

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let app = api(
        routers::plans::routes(Arc::clone(&db_pool)),
        routers::reservations::routes(Arc::clone(&db_pool)),
        routers::payments::routes(Arc::clone(&db_pool)),
        Arc::new(JwtVerifier::new(&config.auth.jwt_secret)),
    )
    .layer(TimeoutLayer::new(Duration::from_secs(
        config.backend_server.timeout,
    )))
    .layer(RequestBodyLimitLayer::new(
        (config.backend_server.body_limit * 1024 * 1024).try_into()?,
    ))
    .layer(
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::PUT,
                Method::DELETE,
            ])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_origin(Any),
    )
    .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        port = config.backend_server.port,
        stage = %config.stage,
        "http: server is running"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "http: failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("http: received ctrl+C signal"),
        _ = terminate => info!("http: received terminate signal"),
    }
}

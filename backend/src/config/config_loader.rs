use anyhow::{Context, Result};
use std::str::FromStr;

use super::{
    config_model::{AuthSecret, BackendServer, Database, DotEnvyConfig},
    stage::Stage,
};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} is not set"))
}

fn parsed<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(key)?
        .parse()
        .with_context(|| format!("{key} is invalid"))
}

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: parsed("SERVER_PORT")?,
        body_limit: parsed("SERVER_BODY_LIMIT")?,
        timeout: parsed("SERVER_TIMEOUT")?,
    };

    let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
        Ok(raw) => raw
            .parse()
            .context("DATABASE_MAX_CONNECTIONS is invalid")?,
        Err(_) => DEFAULT_MAX_CONNECTIONS,
    };
    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections,
    };

    let auth = AuthSecret {
        jwt_secret: required("JWT_SECRET")?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
        stage: get_stage(),
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or_default();
    Stage::try_from(&stage_str).unwrap_or_default()
}

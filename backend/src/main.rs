//! Backend entry-point: loads configuration, prepares the database and serves
//! the REST API.

mod server;

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use farmwise::inbound::http::health::HealthState;
use farmwise::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use farmwise::settings::FarmwiseSettings;
use ortho_config::OrthoConfig;

use server::{Repositories, ServerConfig, build_http_state, create_server};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt().with_env_filter(filter).json().try_init() {
        warn!(error = %e, "tracing init failed");
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings = FarmwiseSettings::load().wrap_err("loading configuration")?;
    let secrets = settings.secrets()?;

    let applied = run_pending_migrations(&secrets.database_url)
        .await
        .wrap_err("applying database migrations")?;
    info!(applied, "database schema up to date");

    let pool = DbPool::new(
        PoolConfig::new(secrets.database_url.clone())
            .with_max_size(settings.database_max_connections.max(1)),
    )
    .await
    .wrap_err("connecting to PostgreSQL")?;

    let http_state = build_http_state(&settings, &secrets, Repositories::diesel(&pool))?;
    let health_state = web::Data::new(HealthState::new().with_dependency_check(Arc::new(pool)));

    let bind_addr = settings.bind_addr();
    let server = create_server(health_state.clone(), ServerConfig::new(bind_addr, http_state))
        .wrap_err_with(|| format!("binding {bind_addr}"))?;
    info!(%bind_addr, "farmwise listening");

    let result = server.await;
    health_state.mark_unhealthy();
    result.wrap_err("server terminated")
}

//! Product catalog REST server

use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        app = %config.app.name,
        database = %config.mongodb.database(),
        "Connecting to MongoDB"
    );
    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;

    let state = AppState::new(config, mongo_client);
    api::ensure_indexes(&state).await?;

    let app = axum_helpers::create_router::<openapi::ApiDoc>(api::routes(&state))?
        .merge(health_router(state.config.app.clone()))
        .merge(api::health::router(state.clone()));

    info!(port = state.config.server.port, "Catalog API listening");

    let mongo_client = state.mongo_client.clone();
    create_production_app(app, &state.config.server, async move {
        mongo_client.shutdown().await;
        info!("MongoDB client closed");
    })
    .await
    .map_err(|e| eyre::eyre!("server error: {e}"))?;

    Ok(())
}

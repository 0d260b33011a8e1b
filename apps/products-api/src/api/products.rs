//! Catalog routes backed by MongoDB and the configured media host

use axum::Router;
use domain_products::{handlers, MongoProductRepository, ProductService};

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    let service = ProductService::new(
        MongoProductRepository::new(&state.db),
        state.media.clone(),
    );
    handlers::router(service, state.jwt.clone())
}

/// SKU uniqueness is enforced by an index, so this must run before serving.
pub async fn ensure_indexes(state: &AppState) -> eyre::Result<()> {
    MongoProductRepository::new(&state.db)
        .init_indexes()
        .await
        .map_err(|e| eyre::eyre!("failed to create product indexes: {e}"))
}

pub mod health;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Everything served under `/api`
pub fn routes(state: &AppState) -> Router {
    Router::new().nest("/products", products::router(state))
}

pub async fn ensure_indexes(state: &AppState) -> eyre::Result<()> {
    products::ensure_indexes(state).await
}

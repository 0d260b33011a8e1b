//! Shared state handed to every route module

use std::sync::Arc;

use axum_helpers::JwtAuth;
use domain_products::{CloudinaryMediaStore, MediaStore};
use mongodb::{Client, Database};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub mongo_client: Client,
    pub db: Database,
    /// Verifies admin bearer tokens
    pub jwt: JwtAuth,
    pub media: Arc<dyn MediaStore>,
}

impl AppState {
    pub fn new(config: Config, mongo_client: Client) -> Self {
        let db = mongo_client.database(config.mongodb.database());
        let jwt = JwtAuth::new(&config.jwt);
        let media: Arc<dyn MediaStore> =
            Arc::new(CloudinaryMediaStore::new(config.cloudinary.clone()));

        Self {
            config,
            mongo_client,
            db,
            jwt,
            media,
        }
    }
}

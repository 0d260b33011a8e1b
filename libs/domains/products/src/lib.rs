//! Product catalog domain.
//!
//! Reads are public; every mutation sits behind a bearer token carrying the
//! `admin` role. Products are never removed from MongoDB, only flagged
//! inactive, and the images they own live on an external media host
//! ([`MediaStore`]).
//!
//! Request flow:
//!
//! ```text
//! handlers ──► ProductService ──┬──► ProductRepository (MongoDB)
//!                               └──► MediaStore (Cloudinary)
//! ```
//!
//! Wiring it up:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use core_config::FromEnv;
//! use domain_products::{handlers, CloudinaryConfig, CloudinaryMediaStore, MongoProductRepository, ProductService};
//!
//! # async fn wire(db: ::mongodb::Database) -> Result<(), Box<dyn std::error::Error>> {
//! let repository = MongoProductRepository::new(&db);
//! repository.init_indexes().await?;
//!
//! let media = Arc::new(CloudinaryMediaStore::new(CloudinaryConfig::from_env()?));
//! let catalog = ProductService::new(repository, media);
//! let app: axum::Router = handlers::router(catalog, JwtAuth::new(&JwtConfig::from_env()?));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod media;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use media::{CloudinaryConfig, CloudinaryMediaStore, DeleteOutcome, MediaError, MediaStore, UploadFile};
pub use models::{
    CreateProduct, ListProductsParams, Product, ProductFilter, ProductImage, SizeChart,
    UploadedImage,
};
pub use mongodb::MongoProductRepository;
pub use repository::ProductRepository;
pub use service::ProductService;

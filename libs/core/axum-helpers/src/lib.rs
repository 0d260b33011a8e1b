//! # Axum Helpers
//!
//! Shared HTTP plumbing for the catalog services.
//!
//! - **[`errors`]**: [`AppError`] and the failure envelope with stable error codes
//! - **[`response`]**: the success envelope [`ApiResponse`]
//! - **[`extractors`]**: [`UuidPath`] and [`ValidatedJson`]
//! - **[`auth`]**: bearer JWT verification and the admin role gate
//! - **[`http`]**: CORS and security headers
//! - **[`server`]**: router factory, health endpoints, graceful shutdown

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod response;
pub mod server;

pub use auth::{ADMIN_ROLE, JwtAuth, JwtClaims, JwtConfig, jwt_auth_middleware, require_admin};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    create_router_with_cors, health_router, run_health_checks, shutdown_signal,
};

pub use http::{cors_layer_from_env, create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{UuidPath, ValidatedJson};

pub use response::ApiResponse;

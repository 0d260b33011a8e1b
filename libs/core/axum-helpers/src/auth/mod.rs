//! Bearer JWT authentication and role checks.
//!
//! Tokens are verified statelessly against the shared HS256 secret. The
//! verified [`JwtClaims`] are placed in request extensions for downstream
//! layers and handlers.
//!
//! ```ignore
//! use axum::middleware::{from_fn, from_fn_with_state};
//! use axum_helpers::auth::{JwtAuth, JwtConfig, jwt_auth_middleware, require_admin};
//! use core_config::FromEnv;
//!
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//!
//! let admin = Router::new()
//!     .route("/products", post(create))
//!     .route_layer(from_fn(require_admin))
//!     .route_layer(from_fn_with_state(auth, jwt_auth_middleware));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use jwt::{ADMIN_ROLE, JwtAuth, JwtClaims};
pub use middleware::{jwt_auth_middleware, require_admin};

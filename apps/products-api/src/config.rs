//! Configuration for Products API

use axum_helpers::JwtConfig;
use core_config::{app_info, server::ServerConfig, AppInfo, FromEnv};
use database::mongodb::MongoConfig;
use domain_products::CloudinaryConfig;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub cloudinary: CloudinaryConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            mongodb: MongoConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            cloudinary: CloudinaryConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [(&str, Option<&str>); 7] = [
        ("JWT_SECRET", Some("config-test-secret-with-32-plus-chars!")),
        ("MONGODB_URL", Some("mongodb://localhost:27017")),
        ("MONGODB_DATABASE", Some("catalog")),
        ("CLOUDINARY_CLOUD_NAME", Some("shop")),
        ("CLOUDINARY_API_KEY", Some("key")),
        ("CLOUDINARY_API_SECRET", Some("secret")),
        ("PORT", Some("3003")),
    ];

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(REQUIRED, || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.server.port, 3003);
            assert_eq!(config.cloudinary.folder, "products");
            assert_eq!(config.app.name, "products_api");
        });
    }

    #[test]
    fn test_config_requires_jwt_secret() {
        let mut vars = REQUIRED.to_vec();
        vars[0] = ("JWT_SECRET", None);

        temp_env::with_vars(vars, || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("JWT_SECRET"), "{err}");
        });
    }
}

//! Cloudinary upload API client.

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_required};
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use super::{DeleteOutcome, MediaError, MediaStore, UploadFile};
use crate::models::UploadedImage;

/// Cloudinary account settings.
///
/// - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` (required)
/// - `CLOUDINARY_FOLDER` (default `products`)
/// - `CLOUDINARY_API_URL` (default `https://api.cloudinary.com/v1_1`)
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Folder new uploads are placed in
    pub folder: String,
    pub api_url: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("folder", &self.folder)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl FromEnv for CloudinaryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            cloud_name: env_required("CLOUDINARY_CLOUD_NAME")?,
            api_key: env_required("CLOUDINARY_API_KEY")?,
            api_secret: env_required("CLOUDINARY_API_SECRET")?,
            folder: env_or_default("CLOUDINARY_FOLDER", "products"),
            api_url: env_or_default("CLOUDINARY_API_URL", "https://api.cloudinary.com/v1_1"),
        })
    }
}

pub struct CloudinaryMediaStore {
    config: CloudinaryConfig,
    client: Client,
}

impl CloudinaryMediaStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        info!(cloud = %config.cloud_name, folder = %config.folder, "Cloudinary media store configured");
        Self {
            config,
            client: Client::new(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    /// SHA-256 request signature over the sorted `key=value` pairs.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        format!("{:x}", Sha256::digest(format!("{}{}", to_sign, self.config.api_secret)))
    }

    async fn error_from(response: reqwest::Response) -> MediaError {
        let status = response.status().as_u16();
        let message = match response.json::<CloudinaryErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => "no error body".to_string(),
        };
        MediaError::Api { status, message }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorDetail,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    #[instrument(skip(self, file), fields(file_name = %file.file_name, size = file.bytes.len()))]
    async fn upload(&self, file: UploadFile) -> Result<UploadedImage, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("folder", self.config.folder.as_str()),
            ("timestamp", timestamp.as_str()),
        ]);

        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name)
            .mime_str(&file.content_type)?;

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("folder", self.config.folder.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        debug!(public_id = %body.public_id, "Image uploaded");
        Ok(UploadedImage {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, public_id: &str) -> Result<DeleteOutcome, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id), ("timestamp", timestamp.as_str())]);

        let params = [
            ("public_id", public_id),
            ("api_key", self.config.api_key.as_str()),
            ("timestamp", timestamp.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        match body.result.as_str() {
            "ok" => Ok(DeleteOutcome::Deleted),
            "not found" => Ok(DeleteOutcome::NotFound),
            other => Err(MediaError::InvalidResponse(format!(
                "unexpected destroy result '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CloudinaryMediaStore {
        CloudinaryMediaStore::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "1234".to_string(),
            api_secret: "abcd".to_string(),
            folder: "products".to_string(),
            api_url: "https://api.cloudinary.com/v1_1/".to_string(),
        })
    }

    #[test]
    fn test_signature_sorts_params_and_appends_secret() {
        let store = store();
        let expected = format!(
            "{:x}",
            Sha256::digest("public_id=products/a&timestamp=1700000000abcd")
        );

        assert_eq!(
            store.sign(&[("timestamp", "1700000000"), ("public_id", "products/a")]),
            expected
        );
    }

    #[test]
    fn test_signature_is_lowercase_hex() {
        let signature = store().sign(&[("timestamp", "1")]);
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            store().endpoint("destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("CLOUDINARY_CLOUD_NAME", Some("shop")),
                ("CLOUDINARY_API_KEY", Some("key")),
                ("CLOUDINARY_API_SECRET", Some("secret")),
                ("CLOUDINARY_FOLDER", None::<&str>),
            ],
            || {
                let config = CloudinaryConfig::from_env().unwrap();
                assert_eq!(config.folder, "products");
                assert!(!format!("{:?}", config).contains("\"secret\""));
            },
        );
    }

    #[test]
    fn test_config_from_env_requires_secret() {
        temp_env::with_vars(
            [
                ("CLOUDINARY_CLOUD_NAME", Some("shop")),
                ("CLOUDINARY_API_KEY", Some("key")),
                ("CLOUDINARY_API_SECRET", None::<&str>),
            ],
            || {
                let err = CloudinaryConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("CLOUDINARY_API_SECRET"));
            },
        );
    }
}

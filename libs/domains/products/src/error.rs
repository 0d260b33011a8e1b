use axum::extract::multipart::MultipartError;
use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::media::MediaError;

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    #[error("Product with SKU '{0}' already exists")]
    DuplicateSku(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid fields: {0}")]
    InvalidFields(#[from] ValidationErrors),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Stored product could not be decoded: {0}")]
    Decode(String),

    #[error("Image upload failed: {0}")]
    MediaUpload(MediaError),

    #[error("Image deletion failed: {0}")]
    MediaDelete(MediaError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl ProductError {
    /// Map a write failure, turning a unique-index violation into [`ProductError::DuplicateSku`].
    pub fn from_write(err: mongodb::error::Error, sku: Option<&str>) -> Self {
        if is_duplicate_key(&err) {
            ProductError::DuplicateSku(sku.unwrap_or_default().to_string())
        } else {
            err.into()
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(id) => AppError::NotFound(format!("Product {} not found", id)),
            ProductError::DuplicateSku(sku) => {
                AppError::Conflict(format!("Product with SKU '{}' already exists", sku))
            }
            ProductError::Validation(msg) => AppError::BadRequest(msg),
            ProductError::InvalidFields(e) => AppError::ValidationError(e),
            ProductError::Multipart(e) => AppError::Multipart(e),
            ProductError::Database(detail) => AppError::Dependency {
                code: ErrorCode::DatabaseError,
                detail,
            },
            ProductError::Decode(detail) => AppError::Dependency {
                code: ErrorCode::DatabaseDecode,
                detail,
            },
            ProductError::MediaUpload(e) => AppError::Dependency {
                code: ErrorCode::MediaUploadFailed,
                detail: e.to_string(),
            },
            ProductError::MediaDelete(e) => AppError::Dependency {
                code: ErrorCode::MediaDeleteFailed,
                detail: e.to_string(),
            },
            ProductError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for ProductError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        ProductError::Decode(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for ProductError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        ProductError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ProductError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                ProductError::DuplicateSku("S1".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                ProductError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ProductError::Database("socket closed".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ProductError::MediaUpload(MediaError::Api {
                    status: 502,
                    message: "bad gateway".to_string(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_not_found_message_names_product() {
        let id = Uuid::now_v7();
        let app: AppError = ProductError::NotFound(id).into();
        assert!(app.to_string().contains(&id.to_string()));
    }
}

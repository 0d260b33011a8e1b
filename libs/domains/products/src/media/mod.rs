//! Media hosting collaborator.
//!
//! Product images live on an external host. The service only needs two calls:
//! push a file and get back `{url, publicId}`, and delete by `publicId`.

mod cloudinary;

pub use cloudinary::{CloudinaryConfig, CloudinaryMediaStore};

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

use crate::models::UploadedImage;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Media host returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected media host response: {0}")]
    InvalidResponse(String),
}

/// A file received from a multipart upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The host had no asset under that handle
    NotFound,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, file: UploadFile) -> Result<UploadedImage, MediaError>;

    async fn delete(&self, public_id: &str) -> Result<DeleteOutcome, MediaError>;
}

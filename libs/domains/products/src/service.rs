//! Product Service - Business logic layer

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use serde_json::{Map, Value};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::media::{DeleteOutcome, MediaStore, UploadFile};
use crate::models::{
    self, CreateProduct, ListProductsParams, ListQuery, Product, ProductFilter, ProductPage,
    SizeChart, SortSpec, UploadedImage, ALLOWED_IMAGE_TYPES, DEFAULT_PAGE_SIZE, IMMUTABLE_FIELDS,
    MAX_PAGE_SIZE, MAX_UPLOAD_FILES, MAX_UPLOAD_FILE_BYTES, SEARCH_RESULT_LIMIT,
};
use crate::repository::ProductRepository;

/// Product service providing business logic operations
///
/// Owns the catalog rules (pagination bounds, update deny-list, soft delete,
/// duplication) and orchestrates the repository and the media store.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
    media: Arc<dyn MediaStore>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R, media: Arc<dyn MediaStore>) -> Self {
        Self {
            repository: Arc::new(repository),
            media,
        }
    }

    /// List active products, one page at a time
    #[instrument(skip(self))]
    pub async fn list_products(&self, params: ListProductsParams) -> ProductResult<ProductPage> {
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(ProductError::Validation(
                "page must be at least 1".to_string(),
            ));
        }

        let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 {
            return Err(ProductError::Validation(
                "limit must be at least 1".to_string(),
            ));
        }
        let limit = limit.min(MAX_PAGE_SIZE);

        let sort = match non_blank(params.sort) {
            Some(key) => key.parse::<SortSpec>().map_err(|_| {
                ProductError::Validation(format!("Unsupported sort key '{}'", key))
            })?,
            None => SortSpec::default(),
        };

        // The driver sends skip as a signed 64-bit integer
        let skip = (page - 1)
            .checked_mul(limit)
            .filter(|skip| i64::try_from(*skip).is_ok())
            .ok_or_else(|| ProductError::Validation("page out of range".to_string()))?;

        let query = ListQuery {
            filter: ProductFilter {
                search: non_blank(params.search),
                category: non_blank(params.category),
                brand: non_blank(params.brand),
            },
            sort,
            skip,
            limit: limit as i64,
        };

        let (items, total) = futures::try_join!(
            self.repository.list(&query),
            self.repository.count(&query.filter)
        )?;

        Ok(ProductPage {
            items,
            total,
            page,
            limit,
        })
    }

    /// Get a product by ID, active or not
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_detail(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<Product> {
        input.validate()?;
        self.repository.create(Product::new(input)).await
    }

    /// Merge a partial JSON object into the stored record.
    ///
    /// Identity, `__v` and timestamps are never taken from the patch.
    #[instrument(skip(self, patch))]
    pub async fn update_product(
        &self,
        id: Uuid,
        mut patch: Map<String, Value>,
    ) -> ProductResult<Product> {
        let existing = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        for key in IMMUTABLE_FIELDS {
            patch.remove(key);
        }
        if matches!(patch.get("sku"), Some(Value::Null)) {
            return Err(ProductError::Validation("sku cannot be cleared".to_string()));
        }

        let mut merged = match serde_json::to_value(&existing) {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                return Err(ProductError::Internal(
                    "product did not serialize to an object".to_string(),
                ))
            }
            Err(e) => return Err(ProductError::Internal(e.to_string())),
        };
        merged.extend(patch);

        let mut updated: Product = serde_json::from_value(Value::Object(merged))
            .map_err(|e| ProductError::Validation(e.to_string()))?;
        updated.validate()?;

        updated.id = existing.id;
        updated.version = existing.version;
        updated.created_at = existing.created_at;
        updated.updated_at = models::now();

        self.repository.replace(&updated).await?;
        tracing::info!(product_id = %id, "Product updated");
        Ok(updated)
    }

    /// Soft delete: release hosted media, then mark the product inactive.
    ///
    /// Media cleanup failures are logged and never block the state change.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> ProductResult<()> {
        let mut product = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let public_ids = product.media_public_ids();
        let outcomes = join_all(public_ids.iter().map(|pid| self.media.delete(pid))).await;

        for (public_id, outcome) in public_ids.iter().zip(outcomes) {
            if let Err(e) = outcome {
                tracing::warn!(product_id = %id, %public_id, error = %e, "Image cleanup failed");
            }
        }

        product.is_active = false;
        product.updated_at = models::now();
        self.repository.replace(&product).await?;

        tracing::info!(product_id = %id, "Product deactivated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn duplicate_product(&self, id: Uuid) -> ProductResult<Product> {
        let source = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let copy = self.repository.create(source.duplicate()).await?;
        tracing::info!(source_id = %id, product_id = %copy.id, "Product duplicated");
        Ok(copy)
    }

    /// Bounded free-text search over active products
    #[instrument(skip(self))]
    pub async fn search_products(&self, q: Option<String>) -> ProductResult<Vec<Product>> {
        let term = non_blank(q)
            .ok_or_else(|| ProductError::Validation("Search query is required".to_string()))?;

        self.repository.search(&term, SEARCH_RESULT_LIMIT).await
    }

    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn upload_images(&self, files: Vec<UploadFile>) -> ProductResult<Vec<UploadedImage>> {
        if files.is_empty() {
            return Err(ProductError::Validation(
                "At least one image is required".to_string(),
            ));
        }
        if files.len() > MAX_UPLOAD_FILES {
            return Err(ProductError::Validation(format!(
                "At most {} images may be uploaded at once",
                MAX_UPLOAD_FILES
            )));
        }
        for file in &files {
            validate_image(file)?;
        }

        try_join_all(files.into_iter().map(|file| self.media.upload(file)))
            .await
            .map_err(ProductError::MediaUpload)
    }

    #[instrument(skip(self, file))]
    pub async fn upload_size_chart(&self, file: Option<UploadFile>) -> ProductResult<SizeChart> {
        let file = file
            .ok_or_else(|| ProductError::Validation("Size chart image is required".to_string()))?;
        validate_image(&file)?;

        let uploaded = self
            .media
            .upload(file)
            .await
            .map_err(ProductError::MediaUpload)?;
        Ok(uploaded.into())
    }

    /// Delete one hosted image; an image the host no longer has counts as deleted.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, public_id: &str) -> ProductResult<()> {
        if public_id.trim().is_empty() {
            return Err(ProductError::Validation(
                "Image public id is required".to_string(),
            ));
        }

        match self.media.delete(public_id).await {
            Ok(DeleteOutcome::Deleted) => Ok(()),
            Ok(DeleteOutcome::NotFound) => {
                tracing::info!(%public_id, "Image already absent from media host");
                Ok(())
            }
            Err(e) => Err(ProductError::MediaDelete(e)),
        }
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            media: Arc::clone(&self.media),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_image(file: &UploadFile) -> ProductResult<()> {
    let essence = file
        .content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if !ALLOWED_IMAGE_TYPES.contains(&essence.as_str()) {
        return Err(ProductError::Validation(format!(
            "Unsupported content type '{}' for '{}'",
            file.content_type, file.file_name
        )));
    }
    if file.bytes.is_empty() {
        return Err(ProductError::Validation(format!(
            "File '{}' is empty",
            file.file_name
        )));
    }
    if file.bytes.len() > MAX_UPLOAD_FILE_BYTES {
        return Err(ProductError::Validation(format!(
            "File '{}' exceeds {} bytes",
            file.file_name, MAX_UPLOAD_FILE_BYTES
        )));
    }
    Ok(())
}

//! In-memory collaborators for handler tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use axum_helpers::{JwtAuth, JwtConfig, ADMIN_ROLE};
use domain_products::models::{generate_sku, ListQuery, ProductFilter, SortField};
use domain_products::{
    handlers, DeleteOutcome, MediaError, MediaStore, Product, ProductError, ProductRepository,
    ProductResult, ProductService, UploadFile, UploadedImage,
};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub const JWT_SECRET: &str = "handler-test-secret-with-at-least-32-chars";

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryProductRepository {
    fn matches(product: &Product, filter: &ProductFilter) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };

        product.is_active
            && filter.search.as_deref().is_none_or(|term| {
                contains(&product.name, term)
                    || contains(&product.description, term)
                    || product.brand.as_deref().is_some_and(|b| contains(b, term))
            })
            && filter
                .category
                .as_deref()
                .is_none_or(|c| product.category == c)
            && filter
                .brand
                .as_deref()
                .is_none_or(|b| product.brand.as_deref().is_some_and(|pb| contains(pb, b)))
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, mut product: Product) -> ProductResult<Product> {
        let mut products = self.products.write().await;
        if product.sku.is_none() {
            product.sku = Some(generate_sku(&product.category));
        }
        if products.values().any(|p| p.sku == product.sku) {
            return Err(ProductError::DuplicateSku(
                product.sku.clone().unwrap_or_default(),
            ));
        }
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn get_detail(&self, id: Uuid) -> ProductResult<Option<Product>> {
        self.get_by_id(id).await
    }

    async fn list(&self, query: &ListQuery) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;
        let mut matched: Vec<Product> = products
            .values()
            .filter(|p| Self::matches(p, &query.filter))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ordering = match query.sort.field {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::Name => a.name.cmp(&b.name),
                SortField::Price => a.price.cmp(&b.price),
                SortField::AverageRating => a.average_rating.total_cmp(&b.average_rating),
                SortField::ReviewCount => a.review_count.cmp(&b.review_count),
            }
            .then(a.id.cmp(&b.id));
            if query.sort.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });

        Ok(matched
            .into_iter()
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn count(&self, filter: &ProductFilter) -> ProductResult<u64> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| Self::matches(p, filter)).count() as u64)
    }

    async fn search(&self, term: &str, limit: i64) -> ProductResult<Vec<Product>> {
        let filter = ProductFilter {
            search: Some(term.to_string()),
            ..Default::default()
        };
        let products = self.products.read().await;
        Ok(products
            .values()
            .filter(|p| Self::matches(p, &filter))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn replace(&self, product: &Product) -> ProductResult<()> {
        let mut products = self.products.write().await;
        match products.get_mut(&product.id) {
            Some(stored) => {
                *stored = product.clone();
                Ok(())
            }
            None => Err(ProductError::NotFound(product.id)),
        }
    }
}

/// Media host double; remembers every delete and can be told to fail some.
#[derive(Default)]
pub struct FakeMediaStore {
    pub deleted: Mutex<Vec<String>>,
    pub failing: HashSet<String>,
    pub missing: HashSet<String>,
}

#[async_trait]
impl MediaStore for FakeMediaStore {
    async fn upload(&self, file: UploadFile) -> Result<UploadedImage, MediaError> {
        Ok(UploadedImage {
            url: format!("https://cdn.test/products/{}", file.file_name),
            public_id: format!("products/{}", file.file_name),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<DeleteOutcome, MediaError> {
        if self.failing.contains(public_id) {
            return Err(MediaError::Api {
                status: 500,
                message: "media host unavailable".to_string(),
            });
        }
        self.deleted.lock().await.push(public_id.to_string());
        if self.missing.contains(public_id) {
            Ok(DeleteOutcome::NotFound)
        } else {
            Ok(DeleteOutcome::Deleted)
        }
    }
}

pub struct TestApp {
    pub router: axum::Router,
    pub media: Arc<FakeMediaStore>,
    pub auth: JwtAuth,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_media(FakeMediaStore::default())
    }

    pub fn with_media(media: FakeMediaStore) -> Self {
        let media = Arc::new(media);
        let auth = JwtAuth::new(&JwtConfig::new(JWT_SECRET));
        let service = ProductService::new(
            InMemoryProductRepository::default(),
            media.clone() as Arc<dyn MediaStore>,
        );
        Self {
            router: handlers::router(service, auth.clone()),
            media,
            auth,
        }
    }

    pub fn admin_token(&self) -> String {
        self.auth
            .create_access_token("admin-1", "admin@shop.test", &[ADMIN_ROLE.to_string()])
            .unwrap()
    }

    pub fn customer_token(&self) -> String {
        self.auth
            .create_access_token("user-1", "user@shop.test", &["customer".to_string()])
            .unwrap()
    }
}

/// `(content-type, body)` for a multipart form with `count` PNG files under `field`.
pub fn multipart_files(field: &str, count: usize) -> (String, Vec<u8>) {
    let boundary = "catalog-test-boundary";
    let mut body = Vec::new();
    for i in 0..count {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{i}.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"fake-png-bytes\r\n");
    }
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nunrelated\r\n--{boundary}--\r\n"
        )
        .as_bytes(),
    );
    (format!("multipart/form-data; boundary={boundary}"), body)
}

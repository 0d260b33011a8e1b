use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{ListQuery, Product, ProductFilter};

/// Persistence boundary for products.
///
/// Implementations own the SKU hook: [`ProductRepository::create`] assigns a
/// generated SKU when the product has none.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new product, generating its SKU if absent
    async fn create(&self, product: Product) -> ProductResult<Product>;

    /// Fetch by id regardless of `isActive`; shipping structure left as a reference
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Like `get_by_id` with the shipping structure resolved to its summary
    async fn get_detail(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// One page of active products, shipping structures resolved
    async fn list(&self, query: &ListQuery) -> ProductResult<Vec<Product>>;

    /// Number of active products matching `filter`
    async fn count(&self, filter: &ProductFilter) -> ProductResult<u64>;

    /// Case-insensitive match over name, brand and description among active products
    async fn search(&self, term: &str, limit: i64) -> ProductResult<Vec<Product>>;

    /// Overwrite the stored record with the same id
    async fn replace(&self, product: &Product) -> ProductResult<()>;
}

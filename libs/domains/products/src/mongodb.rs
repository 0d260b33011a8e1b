//! MongoDB implementation of ProductRepository

use std::collections::HashMap;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, spec::BinarySubtype, Binary, Bson, Document},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    generate_sku, ListQuery, Product, ProductFilter, ShippingStructureRef,
    ShippingStructureSummary, SortSpec,
};
use crate::repository::ProductRepository;

const PRODUCTS: &str = "products";
const SHIPPING_STRUCTURES: &str = "shipping_structures";

/// Generated SKUs are retried this many times on a unique-index collision
const SKU_ATTEMPTS: usize = 3;

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<Product>,
    shipping: Collection<ShippingStructureSummary>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<Product>(PRODUCTS),
            shipping: db.collection::<ShippingStructureSummary>(SHIPPING_STRUCTURES),
        }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "sku": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .sparse(true)
                        .name("idx_sku_unique".to_string())
                        .build(),
                )
                .build(),
            // Listing: active products by category, newest first
            IndexModel::builder()
                .keys(doc! { "isActive": 1, "category": 1, "createdAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_active_category_created".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "brand": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_brand".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "createdAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_created_at".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    /// Build a MongoDB filter document from ProductFilter.
    ///
    /// User input is regex-escaped before it reaches `$regex`.
    fn build_filter(filter: &ProductFilter) -> Document {
        let mut doc = doc! { "isActive": true };

        if let Some(ref search) = filter.search {
            doc.insert("$or", text_match(search));
        }

        if let Some(ref category) = filter.category {
            doc.insert("category", category.as_str());
        }

        if let Some(ref brand) = filter.brand {
            doc.insert(
                "brand",
                doc! { "$regex": regex::escape(brand), "$options": "i" },
            );
        }

        doc
    }

    fn build_sort(sort: &SortSpec) -> Document {
        let direction = if sort.descending { -1 } else { 1 };
        let mut doc = Document::new();
        doc.insert(sort.field.to_string(), direction);
        // Stable paging across equal keys
        doc.insert("_id", direction);
        doc
    }

    /// Swap shipping references for their summaries, one query per page.
    ///
    /// References whose structure no longer exists are left as bare ids.
    async fn populate(&self, mut products: Vec<Product>) -> ProductResult<Vec<Product>> {
        let ids: Vec<Bson> = products
            .iter()
            .filter_map(|p| match p.shipping_structure {
                Some(ShippingStructureRef::Reference(id)) => Some(uuid_bson(id)),
                _ => None,
            })
            .collect();

        if ids.is_empty() {
            return Ok(products);
        }

        let summaries: Vec<ShippingStructureSummary> = self
            .shipping
            .find(doc! { "_id": { "$in": ids } })
            .projection(doc! { "name": 1, "description": 1 })
            .await?
            .try_collect()
            .await?;

        let by_id: HashMap<Uuid, ShippingStructureSummary> =
            summaries.into_iter().map(|s| (s.id, s)).collect();

        for product in &mut products {
            if let Some(ShippingStructureRef::Reference(id)) = product.shipping_structure {
                if let Some(summary) = by_id.get(&id) {
                    product.shipping_structure =
                        Some(ShippingStructureRef::Populated(summary.clone()));
                }
            }
        }

        Ok(products)
    }
}

/// Uuids are written by the raw serializer as generic-subtype binary, so
/// filters must use the same encoding rather than the string form.
fn uuid_bson(id: Uuid) -> Bson {
    Bson::Binary(Binary {
        subtype: BinarySubtype::Generic,
        bytes: id.as_bytes().to_vec(),
    })
}

fn by_id(id: Uuid) -> Document {
    doc! { "_id": uuid_bson(id) }
}

fn text_match(term: &str) -> Vec<Document> {
    let pattern = regex::escape(term);
    ["name", "description", "brand"]
        .into_iter()
        .map(|field| {
            let mut clause = Document::new();
            clause.insert(field, doc! { "$regex": pattern.as_str(), "$options": "i" });
            clause
        })
        .collect()
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, product), fields(product_id = %product.id, product_name = %product.name))]
    async fn create(&self, mut product: Product) -> ProductResult<Product> {
        product.shipping_structure = product
            .shipping_structure
            .map(ShippingStructureRef::into_reference);

        let generated = product.sku.is_none();
        let attempts = if generated { SKU_ATTEMPTS } else { 1 };

        for attempt in 1..=attempts {
            if generated {
                product.sku = Some(generate_sku(&product.category));
            }

            match self.collection.insert_one(&product).await {
                Ok(_) => {
                    tracing::info!(sku = ?product.sku, "Product created successfully");
                    return Ok(product);
                }
                Err(e) => match ProductError::from_write(e, product.sku.as_deref()) {
                    ProductError::DuplicateSku(sku) if generated && attempt < attempts => {
                        tracing::warn!(%sku, attempt, "Generated SKU collided, regenerating");
                    }
                    other => return Err(other),
                },
            }
        }

        Err(ProductError::Internal(
            "exhausted SKU generation attempts".to_string(),
        ))
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let product = self.collection.find_one(by_id(id)).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_detail(&self, id: Uuid) -> ProductResult<Option<Product>> {
        match self.collection.find_one(by_id(id)).await? {
            Some(product) => Ok(self.populate(vec![product]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &ListQuery) -> ProductResult<Vec<Product>> {
        let products: Vec<Product> = self
            .collection
            .find(Self::build_filter(&query.filter))
            .sort(Self::build_sort(&query.sort))
            .skip(query.skip)
            .limit(query.limit)
            .await?
            .try_collect()
            .await?;

        self.populate(products).await
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: &ProductFilter) -> ProductResult<u64> {
        let count = self
            .collection
            .count_documents(Self::build_filter(filter))
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn search(&self, term: &str, limit: i64) -> ProductResult<Vec<Product>> {
        let filter = Self::build_filter(&ProductFilter {
            search: Some(term.to_string()),
            ..Default::default()
        });

        let products: Vec<Product> = self
            .collection
            .find(filter)
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;

        Ok(products)
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn replace(&self, product: &Product) -> ProductResult<()> {
        let mut stored = product.clone();
        stored.shipping_structure = stored
            .shipping_structure
            .map(ShippingStructureRef::into_reference);

        let result = self
            .collection
            .replace_one(by_id(product.id), &stored)
            .await
            .map_err(|e| ProductError::from_write(e, product.sku.as_deref()))?;

        if result.matched_count == 0 {
            return Err(ProductError::NotFound(product.id));
        }

        tracing::info!("Product replaced");
        Ok(())
    }
}

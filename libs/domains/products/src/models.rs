use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Default page size for listings
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Requested page sizes above this are clamped
pub const MAX_PAGE_SIZE: u64 = 100;
/// Upper bound on free-text search results
pub const SEARCH_RESULT_LIMIT: i64 = 20;
/// Files accepted by one image upload request
pub const MAX_UPLOAD_FILES: usize = 10;
/// Per-file size limit for uploads
pub const MAX_UPLOAD_FILE_BYTES: usize = 10 * 1024 * 1024;
/// Content types accepted by the upload endpoints
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Keys a partial update may never touch
pub const IMMUTABLE_FIELDS: [&str; 5] = ["_id", "id", "__v", "createdAt", "updatedAt"];

/// Hosted image owned by a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    /// Media host handle used for deletion
    pub public_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SizeChart {
    pub image_url: String,
    pub image_public_id: String,
}

/// Projection of an entry in the external `shipping_structures` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShippingStructureSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Stored as a bare id; read paths may swap in the resolved summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ShippingStructureRef {
    Populated(ShippingStructureSummary),
    Reference(Uuid),
}

impl ShippingStructureRef {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Populated(summary) => summary.id,
            Self::Reference(id) => *id,
        }
    }

    /// Collapse to the stored form.
    pub fn into_reference(self) -> Self {
        Self::Reference(self.id())
    }
}

/// Product record stored in MongoDB
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stored as `_id`; `id` is accepted on input
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    /// Price in cents
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Unique; assigned on insert when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub size_chart: Option<SizeChart>,
    #[serde(default)]
    pub shipping_structure: Option<ShippingStructureRef>,
    /// `false` once soft-deleted
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub review_count: i32,
    #[serde(rename = "__v", default)]
    pub version: i64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    /// Price in cents
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    pub size_chart: Option<SizeChart>,
    /// Id of an entry in `shipping_structures`
    pub shipping_structure: Option<Uuid>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Query string of `GET /products`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProductsParams {
    /// 1-based page number (default 1)
    pub page: Option<u64>,
    /// Page size (default 10, clamped to 100)
    pub limit: Option<u64>,
    /// Case-insensitive match on name, description or brand
    pub search: Option<String>,
    /// Exact category
    pub category: Option<String>,
    /// Case-insensitive brand substring
    pub brand: Option<String>,
    /// Sort key, `-` prefix for descending (default `-createdAt`)
    pub sort: Option<String>,
}

/// Query string of `GET /products/search`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Search term (required)
    pub q: Option<String>,
}

/// Storage-level filter; every query is restricted to active products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
}

/// Fields a listing may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Name,
    Price,
    AverageRating,
    ReviewCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub descending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for SortSpec {
    type Err = strum::ParseError;

    /// `price`, `-createdAt`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, key) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        Ok(Self {
            field: key.parse()?,
            descending,
        })
    }
}

/// Resolved listing request handed to the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: ProductFilter,
    pub sort: SortSpec,
    pub skip: u64,
    pub limit: i64,
}

/// One page of products plus the numbers the envelope reports
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Result of pushing one file to the media host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

impl From<UploadedImage> for SizeChart {
    fn from(image: UploadedImage) -> Self {
        Self {
            image_url: image.url,
            image_public_id: image.public_id,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Current time at the precision timestamps are stored with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// RFC 3339 with exactly three fractional digits and a `Z` suffix, so the
/// stored strings order the same way as the instants they encode.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}

/// `<CAT>-<8 uppercase hex>`; `<CAT>` is the first three alphanumerics of the
/// category, uppercased, or `GEN` when there are none.
pub fn generate_sku(category: &str) -> String {
    let prefix: String = category
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();
    let prefix = if prefix.is_empty() {
        "GEN".to_string()
    } else {
        prefix
    };

    let random = Uuid::new_v4();
    let bytes = random.as_bytes();
    format!(
        "{}-{:02X}{:02X}{:02X}{:02X}",
        prefix, bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

impl Product {
    pub fn new(input: CreateProduct) -> Self {
        let now = now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
            brand: input.brand,
            category: input.category,
            price: input.price,
            stock: input.stock,
            tags: input.tags,
            sku: input.sku,
            images: input.images,
            size_chart: input.size_chart,
            shipping_structure: input.shipping_structure.map(ShippingStructureRef::Reference),
            is_active: input.is_active,
            average_rating: 0.0,
            review_count: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy for the duplicate operation: new identity and timestamps, name
    /// suffixed with ` (Copy)`, SKU cleared and rating aggregates reset.
    pub fn duplicate(&self) -> Self {
        let now = now();
        Self {
            id: Uuid::now_v7(),
            name: format!("{} (Copy)", self.name),
            sku: None,
            average_rating: 0.0,
            review_count: 0,
            version: 0,
            shipping_structure: self
                .shipping_structure
                .clone()
                .map(ShippingStructureRef::into_reference),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Every media handle this product owns, size chart included.
    pub fn media_public_ids(&self) -> Vec<String> {
        self.images
            .iter()
            .map(|image| image.public_id.clone())
            .chain(
                self.size_chart
                    .as_ref()
                    .map(|chart| chart.image_public_id.clone()),
            )
            .collect()
    }
}

//! HTTP handlers for Products API

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put, MethodRouter},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        ConflictResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
    jwt_auth_middleware, require_admin, ApiResponse, AppError, JwtAuth, UuidPath, ValidatedJson,
};
use serde_json::Value;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::error::ProductError;
use crate::media::UploadFile;
use crate::models::{
    CreateProduct, ListProductsParams, Product, ProductImage, SearchParams, ShippingStructureRef,
    ShippingStructureSummary, SizeChart, UploadedImage, MAX_UPLOAD_FILES, MAX_UPLOAD_FILE_BYTES,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// Multipart field carrying product images
pub const IMAGES_FIELD: &str = "images";
/// Multipart field carrying the size chart
pub const SIZE_CHART_FIELD: &str = "sizeChart";

/// Largest accepted request body: a full image batch plus form overhead
const BODY_LIMIT: usize = MAX_UPLOAD_FILES * MAX_UPLOAD_FILE_BYTES + 1024 * 1024;

type SharedService<R> = Arc<ProductService<R>>;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        search_products,
        get_product,
        create_product,
        update_product,
        delete_product,
        duplicate_product,
        upload_images,
        upload_size_chart,
        delete_image,
    ),
    components(
        schemas(
            Product, CreateProduct, ProductImage, SizeChart, ShippingStructureRef,
            ShippingStructureSummary, UploadedImage, ImageUploadForm, SizeChartUploadForm
        ),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

/// Multipart body of `POST /upload/images`
#[derive(ToSchema)]
#[allow(dead_code)]
struct ImageUploadForm {
    /// Up to 10 image files
    #[schema(value_type = Vec<String>)]
    images: Vec<Vec<u8>>,
}

/// Multipart body of `POST /upload/size-chart`
#[derive(ToSchema)]
#[allow(dead_code)]
#[schema(rename_all = "camelCase")]
struct SizeChartUploadForm {
    #[schema(value_type = String, format = Binary)]
    size_chart: Vec<u8>,
}

/// Create the products router.
///
/// Reads are public; every mutation and upload requires a bearer token
/// carrying the `admin` role.
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>, auth: JwtAuth) -> Router {
    let admin = |route: MethodRouter<SharedService<R>>| {
        route
            .route_layer(middleware::from_fn(require_admin))
            .route_layer(middleware::from_fn_with_state(
                auth.clone(),
                jwt_auth_middleware,
            ))
    };

    Router::new()
        .route("/", get(list_products::<R>).merge(admin(post(create_product::<R>))))
        .route("/search", get(search_products::<R>))
        .route(
            "/{id}",
            get(get_product::<R>).merge(admin(put(update_product::<R>).delete(delete_product::<R>))),
        )
        .route("/{id}/duplicate", admin(post(duplicate_product::<R>)))
        .route("/upload/images", admin(post(upload_images::<R>)))
        .route("/upload/size-chart", admin(post(upload_size_chart::<R>)))
        .route("/images/{*public_id}", admin(delete(delete_image::<R>)))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(Arc::new(service))
}

/// List active products
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(ListProductsParams),
    responses(
        (status = 200, description = "One page of active products", body = ApiResponse<Vec<Product>>),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    query: Result<Query<ListProductsParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let page = service.list_products(params).await?;
    Ok(ApiResponse::paginated(
        page.items, page.total, page.page, page.limit,
    ))
}

/// Search active products by name, brand or description
#[utoipa::path(
    get,
    path = "/search",
    tag = "Products",
    params(SearchParams),
    responses(
        (status = 200, description = "At most 20 matching products", body = ApiResponse<Vec<Product>>),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_products<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let products = service.search_products(params.q).await?;
    Ok(ApiResponse::list(products))
}

/// Get a product by ID, including inactive ones
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ApiResponse<Product>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    UuidPath(id): UuidPath,
) -> Result<impl IntoResponse, AppError> {
    let product = service.get_product(id).await?;
    Ok(ApiResponse::ok(product))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body = CreateProduct,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Product created successfully", body = ApiResponse<Product>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> Result<impl IntoResponse, AppError> {
    let product = service.create_product(input).await?;
    Ok(ApiResponse::ok(product)
        .with_message("Product created successfully")
        .status(StatusCode::CREATED))
}

/// Partially update a product
///
/// Any product field may be supplied; `_id`, `id`, `__v`, `createdAt` and
/// `updatedAt` are ignored.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body(content = Product, description = "Any subset of product fields"),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product updated successfully", body = ApiResponse<Product>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    UuidPath(id): UuidPath,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(value) = payload?;
    let Value::Object(patch) = value else {
        return Err(AppError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let product = service.update_product(id, patch).await?;
    Ok(ApiResponse::ok(product).with_message("Product updated successfully"))
}

/// Soft delete a product and release its images
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product deleted successfully"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    UuidPath(id): UuidPath,
) -> Result<impl IntoResponse, AppError> {
    service.delete_product(id).await?;
    Ok(ApiResponse::message("Product deleted successfully"))
}

/// Duplicate a product under a new id and SKU
#[utoipa::path(
    post,
    path = "/{id}/duplicate",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Source product ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Product duplicated successfully", body = ApiResponse<Product>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn duplicate_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    UuidPath(id): UuidPath,
) -> Result<impl IntoResponse, AppError> {
    let product = service.duplicate_product(id).await?;
    Ok(ApiResponse::ok(product)
        .with_message("Product duplicated successfully")
        .status(StatusCode::CREATED))
}

/// Upload product images to the media host
#[utoipa::path(
    post,
    path = "/upload/images",
    tag = "Products",
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Images uploaded", body = ApiResponse<Vec<UploadedImage>>),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn upload_images<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let files = collect_files(multipart, IMAGES_FIELD, MAX_UPLOAD_FILES).await?;
    let images = service.upload_images(files).await?;
    Ok(ApiResponse::list(images)
        .with_message("Images uploaded successfully")
        .status(StatusCode::CREATED))
}

/// Upload a size chart image to the media host
#[utoipa::path(
    post,
    path = "/upload/size-chart",
    tag = "Products",
    request_body(content = SizeChartUploadForm, content_type = "multipart/form-data"),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Size chart uploaded", body = ApiResponse<SizeChart>),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn upload_size_chart<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let file = collect_files(multipart, SIZE_CHART_FIELD, 1).await?.pop();
    let chart = service.upload_size_chart(file).await?;
    Ok(ApiResponse::ok(chart)
        .with_message("Size chart uploaded successfully")
        .status(StatusCode::CREATED))
}

/// Delete a hosted image by its public id
///
/// Folder separators may be sent raw or percent-encoded.
#[utoipa::path(
    delete,
    path = "/images/{public_id}",
    tag = "Products",
    params(
        ("public_id" = String, Path, description = "Media host public id, e.g. `products/abc123`")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Image deleted"),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_image<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    Path(public_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let public_id = urlencoding::decode(&public_id)
        .map_err(|_| AppError::BadRequest("Image public id is not valid UTF-8".to_string()))?;

    service.delete_image(&public_id).await?;
    Ok(ApiResponse::message("Image deleted successfully"))
}

/// Read every file sent under `field`, rejecting the request once more than
/// `max` arrive. Other fields are skipped.
async fn collect_files(
    mut multipart: Multipart,
    field: &str,
    max: usize,
) -> Result<Vec<UploadFile>, ProductError> {
    let mut files = Vec::new();

    while let Some(part) = multipart.next_field().await? {
        if part.name() != Some(field) {
            continue;
        }
        if files.len() == max {
            return Err(ProductError::Validation(format!(
                "At most {} file(s) may be sent in '{}'",
                max, field
            )));
        }

        let file_name = part.file_name().unwrap_or("upload").to_string();
        let content_type = part
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = part.bytes().await?;

        files.push(UploadFile {
            file_name,
            content_type,
            bytes,
        });
    }

    Ok(files)
}

//! Handler tests for Products domain
//!
//! Drive the products router with in-memory collaborators:
//! - auth gating (public reads, admin-only writes)
//! - envelope shape and status codes
//! - soft delete, duplicate and update semantics end to end
//! - multipart upload limits

mod common;

use std::collections::HashSet;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use common::{multipart_files, FakeMediaStore, TestApp};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt; // For oneshot()

// Helper to parse JSON response body
async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn upload(uri: &str, token: &str, field: &str, count: usize) -> Request<Body> {
    let (content_type, body) = multipart_files(field, count);
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

fn shirt() -> Value {
    json!({
        "name": "Shirt",
        "sku": "S1",
        "category": "shirts",
        "brand": "Northwind",
        "price": 2500,
        "stock": 3,
        "isActive": true,
        "images": [
            { "url": "https://cdn.test/products/a.png", "publicId": "products/a" }
        ],
        "sizeChart": {
            "imageUrl": "https://cdn.test/products/chart.png",
            "imagePublicId": "products/chart"
        }
    })
}

async fn create(app: &TestApp, body: Value) -> Value {
    let response = send(app, authed("POST", "/", &app.admin_token(), Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["data"].clone()
}

#[tokio::test]
async fn test_create_requires_token() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(shirt().to_string()))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_create_rejects_non_admin() {
    let app = TestApp::new();
    let token = app.customer_token();

    let response = send(&app, authed("POST", "/", &token, Some(shirt()))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, authed("DELETE", "/images/products%2Fa", &token, None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_returns_201_with_envelope() {
    let app = TestApp::new();
    let response = send(&app, authed("POST", "/", &app.admin_token(), Some(shirt()))).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Shirt");
    assert_eq!(body["data"]["sku"], "S1");
    assert_eq!(body["data"]["__v"], 0);
    assert!(body["data"]["_id"].is_string());
}

#[tokio::test]
async fn test_create_generates_sku() {
    let app = TestApp::new();
    let mut payload = shirt();
    payload.as_object_mut().unwrap().remove("sku");

    let product = create(&app, payload).await;
    assert!(product["sku"].as_str().unwrap().starts_with("SHI-"));
}

#[tokio::test]
async fn test_create_validates_input() {
    let app = TestApp::new();
    let payload = json!({ "name": "", "category": "shirts", "price": -5 });

    let response = send(&app, authed("POST", "/", &app.admin_token(), Some(payload))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_sku_is_conflict() {
    let app = TestApp::new();
    create(&app, shirt()).await;

    let response = send(&app, authed("POST", "/", &app.admin_token(), Some(shirt()))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "CONFLICT");
}

#[tokio::test]
async fn test_soft_delete_hides_from_list_but_not_get() {
    let app = TestApp::new();
    let product = create(&app, shirt()).await;
    let id = product["_id"].as_str().unwrap().to_string();

    let response = send(&app, authed("DELETE", &format!("/{id}"), &app.admin_token(), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert!(body.get("data").is_none());

    let list = json_body(send(&app, get("/")).await).await;
    assert_eq!(list["total"], 0);
    assert_eq!(list["data"].as_array().unwrap().len(), 0);

    let response = send(&app, get(&format!("/{id}"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["isActive"], false);

    let deleted: HashSet<String> = app.media.deleted.lock().await.iter().cloned().collect();
    assert!(deleted.contains("products/a"));
    assert!(deleted.contains("products/chart"));
}

#[tokio::test]
async fn test_delete_succeeds_when_media_cleanup_fails() {
    let app = TestApp::with_media(FakeMediaStore {
        failing: HashSet::from(["products/a".to_string()]),
        ..Default::default()
    });
    let product = create(&app, shirt()).await;
    let uri = format!("/{}", product["_id"].as_str().unwrap());

    for _ in 0..2 {
        let response = send(&app, authed("DELETE", &uri, &app.admin_token(), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let app = TestApp::new();
    let uri = format!("/{}", uuid::Uuid::now_v7());
    let token = app.admin_token();

    assert_eq!(send(&app, get(&uri)).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        send(&app, authed("PUT", &uri, &token, Some(json!({"name": "x"})))).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        send(&app, authed("DELETE", &uri, &token, None)).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        send(&app, authed("POST", &format!("{uri}/duplicate"), &token, None))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let app = TestApp::new();
    let response = send(&app, get("/not-a-uuid")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "INVALID_UUID");
}

#[tokio::test]
async fn test_update_ignores_immutable_fields() {
    let app = TestApp::new();
    let product = create(&app, shirt()).await;
    let id = product["_id"].as_str().unwrap();

    let patch = json!({
        "_id": uuid::Uuid::now_v7(),
        "__v": 7,
        "createdAt": "2000-01-01T00:00:00Z",
        "name": "Oxford Shirt",
        "price": 3100
    });
    let response = send(&app, authed("PUT", &format!("/{id}"), &app.admin_token(), Some(patch))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = json_body(response).await["data"].clone();
    assert_eq!(updated["_id"], product["_id"]);
    assert_eq!(updated["__v"], product["__v"]);
    assert_eq!(updated["createdAt"], product["createdAt"]);
    assert_eq!(updated["name"], "Oxford Shirt");
    assert_eq!(updated["price"], 3100);
    assert_eq!(updated["sku"], "S1");
}

#[tokio::test]
async fn test_update_cannot_clear_sku() {
    let app = TestApp::new();
    let product = create(&app, shirt()).await;
    let uri = format!("/{}", product["_id"].as_str().unwrap());

    let response = send(&app, authed("PUT", &uri, &app.admin_token(), Some(json!({ "sku": null })))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let stored = json_body(send(&app, get(&uri)).await).await;
    assert_eq!(stored["data"]["sku"], "S1");
}

#[tokio::test]
async fn test_update_type_mismatch_is_bad_request() {
    let app = TestApp::new();
    let product = create(&app, shirt()).await;
    let uri = format!("/{}", product["_id"].as_str().unwrap());
    let token = app.admin_token();

    let response = send(&app, authed("PUT", &uri, &token, Some(json!({"price": "free"})))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, authed("PUT", &uri, &token, Some(json!(["not", "an", "object"])))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_resets_identity() {
    let app = TestApp::new();
    let source = create(&app, shirt()).await;
    let uri = format!("/{}/duplicate", source["_id"].as_str().unwrap());

    let response = send(&app, authed("POST", &uri, &app.admin_token(), None)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let copy = json_body(response).await["data"].clone();
    assert_ne!(copy["_id"], source["_id"]);
    assert_ne!(copy["sku"], source["sku"]);
    assert_eq!(copy["name"], "Shirt (Copy)");
    assert_eq!(copy["averageRating"], 0.0);
    assert_eq!(copy["reviewCount"], 0);
    assert_eq!(copy["price"], source["price"]);
    assert_eq!(copy["images"], source["images"]);
}

#[tokio::test]
async fn test_list_paginates_and_filters() {
    let app = TestApp::new();
    for (i, category) in ["shirts", "shirts", "shirts", "shoes"].into_iter().enumerate() {
        let mut payload = shirt();
        payload["sku"] = json!(format!("SKU-{i}"));
        payload["category"] = json!(category);
        payload["price"] = json!(1000 + i as i64);
        create(&app, payload).await;
    }

    let body = json_body(send(&app, get("/?category=shirts&limit=2&page=2&sort=price")).await).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 2);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["price"], 1002);

    let body = json_body(send(&app, get("/?brand=NORTH")).await).await;
    assert_eq!(body["total"], 4);
}

#[tokio::test]
async fn test_list_rejects_bad_query() {
    let app = TestApp::new();

    for uri in ["/?sort=-secret", "/?page=0", "/?limit=0", "/?page=abc"] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_search_requires_query() {
    let app = TestApp::new();

    assert_eq!(send(&app, get("/search")).await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(send(&app, get("/search?q=%20%20")).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_skips_inactive() {
    let app = TestApp::new();
    let active = create(&app, shirt()).await;

    let mut hidden = shirt();
    hidden["sku"] = json!("S2");
    hidden["isActive"] = json!(false);
    create(&app, hidden).await;

    let body = json_body(send(&app, get("/search?q=shirt")).await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["_id"], active["_id"]);
}

#[tokio::test]
async fn test_search_caps_results_at_twenty() {
    let app = TestApp::new();
    for i in 0..25 {
        let mut payload = shirt();
        payload["sku"] = json!(format!("CAP-{i}"));
        create(&app, payload).await;
    }

    let body = json_body(send(&app, get("/search?q=shirt")).await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 20);
    assert_eq!(body["data"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_upload_rejects_non_multipart_body_with_json_error() {
    let app = TestApp::new();
    let token = app.admin_token();

    for uri in ["/upload/images", "/upload/size-chart"] {
        let response = send(&app, authed("POST", uri, &token, Some(json!({})))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = json_body(response).await;
        assert_eq!(body["success"], false, "{uri}");
    }

    let request = Request::builder()
        .method("POST")
        .uri("/upload/images")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "multipart/form-data")
        .body(Body::from("no boundary"))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn test_upload_images_limits() {
    let app = TestApp::new();
    let token = app.admin_token();

    let response = send(&app, upload("/upload/images", &token, "images", 11)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, upload("/upload/images", &token, "images", 0)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, upload("/upload/images", &token, "images", 2)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["publicId"], "products/0.png");
}

#[tokio::test]
async fn test_upload_size_chart() {
    let app = TestApp::new();
    let token = app.admin_token();

    let response = send(&app, upload("/upload/size-chart", &token, "sizeChart", 0)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, upload("/upload/size-chart", &token, "sizeChart", 1)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["imagePublicId"], "products/0.png");
}

#[tokio::test]
async fn test_delete_image_decodes_public_id() {
    let app = TestApp::with_media(FakeMediaStore {
        missing: HashSet::from(["products/gone".to_string()]),
        ..Default::default()
    });
    let token = app.admin_token();

    let response = send(&app, authed("DELETE", "/images/products%2Fabc123", &token, None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, authed("DELETE", "/images/products/gone", &token, None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let deleted = app.media.deleted.lock().await.clone();
    assert_eq!(deleted, vec!["products/abc123".to_string(), "products/gone".to_string()]);
}

#[tokio::test]
async fn test_delete_image_propagates_media_failure() {
    let app = TestApp::with_media(FakeMediaStore {
        failing: HashSet::from(["products/broken".to_string()]),
        ..Default::default()
    });

    let response = send(
        &app,
        authed("DELETE", "/images/products%2Fbroken", &app.admin_token(), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "MEDIA_DELETE_FAILED");
    assert!(!body["message"].as_str().unwrap().contains("unavailable"));
}

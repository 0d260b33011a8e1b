//! Success envelope shared by every endpoint.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

/// `{success, message?, count?, total?, totalPages?, currentPage?, data?}`
///
/// Absent fields are omitted from the JSON body.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Number of items in `data` when it is a list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            count: None,
            total: None,
            total_pages: None,
            current_page: None,
            data: Some(data),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Pair the envelope with a status code.
    pub fn status(self, status: StatusCode) -> (StatusCode, Json<Self>) {
        (status, Json(self))
    }
}

impl ApiResponse<()> {
    /// Envelope with a message and no `data`.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            count: None,
            total: None,
            total_pages: None,
            current_page: None,
            data: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// List envelope; `count` is the number of items.
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        let mut response = Self::ok(items);
        response.count = Some(count);
        response
    }

    /// One page of a larger result set.
    ///
    /// `totalPages` is `ceil(total / limit)`; a zero `limit` yields zero pages.
    pub fn paginated(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let mut response = Self::list(items);
        response.total = Some(total);
        response.total_pages = Some(if limit == 0 { 0 } else { total.div_ceil(limit) });
        response.current_page = Some(page);
        response
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_omits_absent_fields() {
        let value = serde_json::to_value(ApiResponse::ok(json!({"name": "Shirt"}))).unwrap();
        assert_eq!(value, json!({"success": true, "data": {"name": "Shirt"}}));
    }

    #[test]
    fn test_message_has_no_data() {
        let value = serde_json::to_value(ApiResponse::message("Product deleted")).unwrap();
        assert_eq!(value, json!({"success": true, "message": "Product deleted"}));
    }

    #[test]
    fn test_paginated_rounds_pages_up() {
        let value = serde_json::to_value(ApiResponse::paginated(vec![1, 2, 3], 21, 3, 10)).unwrap();
        assert_eq!(value["count"], 3);
        assert_eq!(value["total"], 21);
        assert_eq!(value["totalPages"], 3);
        assert_eq!(value["currentPage"], 3);
    }

    #[test]
    fn test_paginated_empty_result() {
        let response = ApiResponse::<Vec<u8>>::paginated(vec![], 0, 1, 10);
        assert_eq!(response.count, Some(0));
        assert_eq!(response.total_pages, Some(0));
    }
}

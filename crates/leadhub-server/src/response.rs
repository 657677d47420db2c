//! The JSON response envelope: `{success, data?, message?}` plus
//! pagination metadata for list endpoints.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `{success: true, data}`
pub fn data<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data: Some(data),
        message: None,
    })
}

/// `{success: true, message}`
pub fn message(message: impl Into<String>) -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        success: true,
        data: None,
        message: Some(message.into()),
    })
}

/// `{success: true, data, message}`
pub fn data_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data: Some(data),
        message: Some(message.into()),
    })
}

/// An unpaginated listing with its item count.
#[derive(Debug, Serialize)]
pub struct CountedResponse<T: Serialize> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

pub fn counted<T: Serialize>(items: Vec<T>) -> Json<CountedResponse<T>> {
    Json(CountedResponse {
        success: true,
        count: items.len(),
        data: items,
    })
}

/// A paginated listing: `count` is the page size actually returned,
/// `total`/`pages` describe the full result set.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
    pub data: Vec<T>,
}

pub fn paginated<T: Serialize>(
    items: Vec<T>,
    total: u64,
    page: u64,
    limit: u64,
) -> Json<PaginatedResponse<T>> {
    let limit = limit.max(1);
    Json(PaginatedResponse {
        success: true,
        count: items.len(),
        total,
        page,
        pages: total.div_ceil(limit),
        data: items,
    })
}

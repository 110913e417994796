//! Catalog handlers: brands, categories, products

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use tienda_common::{validate, BrandPayload, CategoryPayload, Error, ProductPayload};

use crate::server::{store_error_response, WebServerState};

fn blank_error(field: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": format!("{} cannot be empty", field)})),
    )
        .into_response()
}

// ============================================================================
// Brands
// ============================================================================

pub async fn list_brands_handler(State(state): State<Arc<WebServerState>>) -> impl IntoResponse {
    match state.db.list_brands() {
        Ok(brands) => (StatusCode::OK, Json(brands)).into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn create_brand_handler(
    State(state): State<Arc<WebServerState>>,
    Json(req): Json<BrandPayload>,
) -> impl IntoResponse {
    for (field, value) in [
        ("name", &req.name),
        ("address", &req.address),
        ("phone", &req.phone),
    ] {
        if value.trim().is_empty() {
            return blank_error(field);
        }
    }
    match state.db.create_brand(&req) {
        Ok(brand) => (StatusCode::CREATED, Json(brand)).into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn get_brand_handler(
    State(state): State<Arc<WebServerState>>,
    Path(brand_id): Path<i64>,
) -> impl IntoResponse {
    match state.db.get_brand(brand_id) {
        Ok(Some(brand)) => (StatusCode::OK, Json(brand)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Brand not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn update_brand_handler(
    State(state): State<Arc<WebServerState>>,
    Path(brand_id): Path<i64>,
    Json(req): Json<BrandPayload>,
) -> impl IntoResponse {
    match state.db.update_brand(brand_id, &req) {
        Ok(Some(brand)) => (StatusCode::OK, Json(brand)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Brand not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn delete_brand_handler(
    State(state): State<Arc<WebServerState>>,
    Path(brand_id): Path<i64>,
) -> impl IntoResponse {
    match state.db.delete_brand(brand_id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Brand not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

// ============================================================================
// Categories
// ============================================================================

pub async fn list_categories_handler(
    State(state): State<Arc<WebServerState>>,
) -> impl IntoResponse {
    match state.db.list_categories() {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn get_category_handler(
    State(state): State<Arc<WebServerState>>,
    Path(category_id): Path<i64>,
) -> impl IntoResponse {
    match state.db.get_category(category_id) {
        Ok(Some(category)) => (StatusCode::OK, Json(category)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Category not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn create_category_handler(
    State(state): State<Arc<WebServerState>>,
    Json(req): Json<CategoryPayload>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return blank_error("Name");
    }
    if req.description.trim().is_empty() {
        return blank_error("Description");
    }
    match state.db.create_category(&req) {
        Ok(category) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "Category created successfully",
                "id": category.id,
            })),
        )
            .into_response(),
        Err(Error::AlreadyExists { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Category already exists"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

/// Partial update: blank fields keep their stored value
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn update_category_handler(
    State(state): State<Arc<WebServerState>>,
    Path(category_id): Path<i64>,
    Json(req): Json<CategoryPatch>,
) -> impl IntoResponse {
    let name = req.name.as_deref().filter(|v| !v.trim().is_empty());
    let description = req.description.as_deref().filter(|v| !v.trim().is_empty());
    match state.db.update_category(category_id, name, description) {
        Ok(Some(_)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": format!("Category {} updated", category_id)
            })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Category not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn delete_category_handler(
    State(state): State<Arc<WebServerState>>,
    Path(category_id): Path<i64>,
) -> impl IntoResponse {
    match state.db.delete_category(category_id) {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "Category deleted successfully"})),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Category not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

// ============================================================================
// Products
// ============================================================================

pub async fn list_products_handler(State(state): State<Arc<WebServerState>>) -> impl IntoResponse {
    match state.db.list_products() {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn get_product_handler(
    State(state): State<Arc<WebServerState>>,
    Path(product_id): Path<i64>,
) -> impl IntoResponse {
    match state.db.get_product(product_id) {
        Ok(Some(product)) => (StatusCode::OK, Json(product)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Product not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

fn validate_product(req: &ProductPayload) -> Result<(), Response> {
    let checks = [
        validate::non_blank("Name", &req.name),
        validate::price(req.price),
        validate::non_blank("Description", &req.description),
        validate::stock(req.stock),
        validate::image_url(&req.img),
    ];
    for check in checks {
        if let Err(e) = check {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": e.to_string()})),
            )
                .into_response());
        }
    }
    Ok(())
}

pub async fn create_product_handler(
    State(state): State<Arc<WebServerState>>,
    Json(req): Json<ProductPayload>,
) -> impl IntoResponse {
    if let Err(resp) = validate_product(&req) {
        return resp;
    }
    match state.db.create_product(&req) {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(Error::AlreadyExists { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "Product already exists"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn update_product_handler(
    State(state): State<Arc<WebServerState>>,
    Path(product_id): Path<i64>,
    Json(req): Json<ProductPayload>,
) -> impl IntoResponse {
    if let Err(resp) = validate_product(&req) {
        return resp;
    }
    match state.db.update_product(product_id, &req) {
        Ok(Some(product)) => (StatusCode::OK, Json(product)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Product not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn delete_product_handler(
    State(state): State<Arc<WebServerState>>,
    Path(product_id): Path<i64>,
) -> impl IntoResponse {
    match state.db.delete_product(product_id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Product not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

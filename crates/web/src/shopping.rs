//! Per-user shopping state: cart, wishlist, orders
//!
//! All handlers here sit behind the bearer middleware; the user id comes
//! from the token claims, never from the payload.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use tienda_common::Error;

use crate::auth::Claims;
use crate::server::{store_error_response, WebServerState};

// ============================================================================
// Cart
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: i64,
}

pub async fn add_to_cart_handler(
    State(state): State<Arc<WebServerState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddToCartRequest>,
) -> impl IntoResponse {
    if req.quantity <= 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "Quantity must be at least 1"})),
        )
            .into_response();
    }
    match state.db.add_to_cart(claims.id, req.product_id, req.quantity) {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "Product added to cart"})),
        )
            .into_response(),
        Err(Error::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Product not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn list_cart_handler(
    State(state): State<Arc<WebServerState>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match state.db.list_cart(claims.id) {
        Ok(lines) if lines.is_empty() => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "Your cart is empty"})),
        )
            .into_response(),
        Ok(lines) => (StatusCode::OK, Json(serde_json::json!({"data": lines}))).into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn update_cart_handler(
    State(state): State<Arc<WebServerState>>,
    Extension(claims): Extension<Claims>,
    Path(cart_id): Path<i64>,
    Json(req): Json<UpdateCartRequest>,
) -> impl IntoResponse {
    match state.db.set_cart_quantity(cart_id, claims.id, req.quantity) {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "Cart item quantity updated successfully"})),
        )
            .into_response(),
        Err(Error::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Cart item not found"})),
        )
            .into_response(),
        Err(Error::InvalidInput(message)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": message})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn remove_from_cart_handler(
    State(state): State<Arc<WebServerState>>,
    Extension(claims): Extension<Claims>,
    Path(cart_id): Path<i64>,
) -> impl IntoResponse {
    match state.db.remove_cart_item(cart_id, claims.id) {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "Product removed from cart successfully"})),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Cart item not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

// ============================================================================
// Wishlist
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AddToWishlistRequest {
    pub product_id: i64,
}

pub async fn add_to_wishlist_handler(
    State(state): State<Arc<WebServerState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddToWishlistRequest>,
) -> impl IntoResponse {
    match state.db.add_to_wishlist(claims.id, req.product_id) {
        Ok(_) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"message": "Product added to your wishlist."})),
        )
            .into_response(),
        Err(Error::AlreadyExists { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "The product is already on your wishlist."})),
        )
            .into_response(),
        Err(Error::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Product not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn list_wishlist_handler(
    State(state): State<Arc<WebServerState>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match state.db.list_wishlist(claims.id) {
        Ok(entries) if entries.is_empty() => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "Your wishlist is empty."})),
        )
            .into_response(),
        Ok(entries) => (
            StatusCode::OK,
            Json(serde_json::json!({"wishlist": entries})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn remove_from_wishlist_handler(
    State(state): State<Arc<WebServerState>>,
    Extension(claims): Extension<Claims>,
    Path(wishlist_id): Path<i64>,
) -> impl IntoResponse {
    match state.db.remove_wishlist_item(wishlist_id, claims.id) {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "Product removed from wishlist."})),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Wishlist item not found."})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

// ============================================================================
// Orders
// ============================================================================

pub async fn create_order_handler(
    State(state): State<Arc<WebServerState>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match state.db.create_order_from_cart(claims.id) {
        Ok(order) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "Order created successfully",
                "order_id": order.id,
                "total_amount": order.total_amount,
            })),
        )
            .into_response(),
        Err(Error::InvalidInput(message)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": message})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn list_orders_handler(
    State(state): State<Arc<WebServerState>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match state.db.list_orders(claims.id) {
        Ok(orders) => (StatusCode::OK, Json(serde_json::json!({"data": orders}))).into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn delete_order_handler(
    State(state): State<Arc<WebServerState>>,
    Extension(claims): Extension<Claims>,
    Path(order_id): Path<i64>,
) -> impl IntoResponse {
    match state.db.delete_order(order_id, claims.id) {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "Order deleted successfully"})),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Order not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

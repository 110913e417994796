//! User account CRUD
//!
//! Same field validation as registration, English messages. Password hashes
//! never leave the database layer serialized.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use tienda_common::{password, validate, NewUser, UserPayload, ROLE_CUSTOMER};

use crate::server::{store_error_response, WebServerState};

/// Validate a payload and hash its password
fn build_new_user(req: UserPayload) -> Result<NewUser, String> {
    validate::non_blank("name", &req.name).map_err(|e| e.to_string())?;
    validate::non_blank("paternal_surname", &req.paternal_surname).map_err(|e| e.to_string())?;
    validate::non_blank("maternal_surname", &req.maternal_surname).map_err(|e| e.to_string())?;
    validate::non_blank("address", &req.address).map_err(|e| e.to_string())?;
    let email = validate::email(&req.email).map_err(|e| e.to_string())?;
    validate::password(&req.password, &req.confirm_password).map_err(|e| e.to_string())?;
    validate::phone(&req.phone).map_err(|e| e.to_string())?;
    validate::payment_method(&req.payment).map_err(|e| e.to_string())?;
    let role = req.role.unwrap_or(ROLE_CUSTOMER);
    validate::role(role).map_err(|e| e.to_string())?;

    Ok(NewUser {
        name: req.name,
        paternal_surname: req.paternal_surname,
        maternal_surname: req.maternal_surname,
        address: req.address,
        email,
        password_hash: password::hash_password(&req.password),
        phone: req.phone,
        payment: req.payment,
        role,
        remember_token: req.remember_token,
    })
}

fn validation_error(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

pub async fn list_users_handler(State(state): State<Arc<WebServerState>>) -> impl IntoResponse {
    match state.db.list_users() {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn get_user_handler(
    State(state): State<Arc<WebServerState>>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    match state.db.get_user(user_id) {
        Ok(Some(user)) => (StatusCode::OK, Json(user)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "User not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn create_user_handler(
    State(state): State<Arc<WebServerState>>,
    Json(req): Json<UserPayload>,
) -> impl IntoResponse {
    let new_user = match build_new_user(req) {
        Ok(user) => user,
        Err(message) => return validation_error(message),
    };
    match state.db.create_user(&new_user) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn update_user_handler(
    State(state): State<Arc<WebServerState>>,
    Path(user_id): Path<i64>,
    Json(req): Json<UserPayload>,
) -> impl IntoResponse {
    let new_user = match build_new_user(req) {
        Ok(user) => user,
        Err(message) => return validation_error(message),
    };
    match state.db.update_user(user_id, &new_user) {
        Ok(Some(user)) => (StatusCode::OK, Json(user)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "User not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn delete_user_handler(
    State(state): State<Arc<WebServerState>>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    match state.db.delete_user(user_id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "User not found"})),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

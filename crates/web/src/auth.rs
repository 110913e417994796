//! Account registration, login, and JWT session handling
//!
//! Login issues an HS256 access token carrying the user's id and role; the
//! bearer middleware validates it and stashes the claims in request
//! extensions for the protected handlers. User-facing auth messages are in
//! Spanish, matching the storefront's locale.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use tienda_common::{password, validate, NewUser, User, UserPayload, ROLE_ADMIN, ROLE_CUSTOMER};

use crate::server::WebServerState;

/// Access token lifetime
pub const TOKEN_TTL_SECS: i64 = 60 * 60 * 12; // 12h

#[derive(Clone, Debug)]
pub struct JwtConfig {
    /// HS256 signing secret
    pub secret: String,
}

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    /// User id
    pub id: i64,
    /// User role (0 = customer, 1 = admin)
    pub role: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Issue an access token for a user
pub fn issue_token(cfg: &JwtConfig, user: &User) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user.email.clone(),
        id: user.id,
        role: user.role,
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )?;
    Ok(token)
}

/// Validate an access token and return its claims
pub fn verify_token(cfg: &JwtConfig, token: &str) -> anyhow::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Bearer-token middleware for the protected route group
pub async fn require_auth(state: Arc<WebServerState>, mut req: Request, next: Next) -> Response {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = header.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"message": "Missing bearer token"})),
        )
            .into_response();
    }

    match verify_token(&state.cfg.jwt, token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"message": "Invalid or expired token"})),
        )
            .into_response(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

pub async fn register_handler(
    State(state): State<Arc<WebServerState>>,
    Json(req): Json<UserPayload>,
) -> impl IntoResponse {
    let missing: Vec<&str> = [
        ("name", &req.name),
        ("paternal_surname", &req.paternal_surname),
        ("maternal_surname", &req.maternal_surname),
        ("address", &req.address),
        ("email", &req.email),
        ("password", &req.password),
        ("confirm_password", &req.confirm_password),
        ("phone", &req.phone),
        ("payment", &req.payment),
    ]
    .iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| *field)
    .collect();
    if !missing.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "message": format!("Los siguientes campos son requeridos: {}", missing.join(", "))
            })),
        )
            .into_response();
    }

    let email = match validate::email(&req.email) {
        Ok(email) => email,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"message": "Formato de correo electrónico inválido"})),
            )
                .into_response()
        }
    };
    match state.db.get_user_by_email(&email) {
        Ok(Some(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"message": "El usuario ya está registrado"})),
            )
                .into_response()
        }
        Ok(None) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
    if req.password != req.confirm_password {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "Las contraseñas no coinciden"})),
        )
            .into_response();
    }
    if req.password.len() < validate::MIN_PASSWORD_LEN {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "La contraseña debe tener al menos 8 caracteres"})),
        )
            .into_response();
    }
    if validate::phone(&req.phone).is_err() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "Formato de número de teléfono inválido"})),
        )
            .into_response();
    }
    if validate::payment_method(&req.payment).is_err() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "message": format!(
                    "Método de pago inválido. Opciones válidas: {}",
                    validate::PAYMENT_METHODS.join(", ")
                )
            })),
        )
            .into_response();
    }
    let role = req.role.unwrap_or(ROLE_CUSTOMER);
    if validate::role(role).is_err() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "Rol inválido"})),
        )
            .into_response();
    }

    let new_user = NewUser {
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
    };

    match state.db.create_user(&new_user) {
        Ok(_) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"message": "Usuario registrado exitosamente"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn login_handler(
    State(state): State<Arc<WebServerState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let missing: Vec<&str> = [("email", &req.email), ("password", &req.password)]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();
    if !missing.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "message": format!("Los siguientes campos son requeridos: {}", missing.join(", "))
            })),
        )
            .into_response();
    }

    let user = match state.db.get_user_by_email(req.email.trim()) {
        Ok(user) => user,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };
    let user = match user {
        Some(user) if password::verify_password(&req.password, &user.password_hash) => user,
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"message": "Credenciales incorrectas"})),
            )
                .into_response()
        }
    };

    match issue_token(&state.cfg.jwt, &user) {
        Ok(access_token) => (StatusCode::OK, Json(LoginResponse { access_token })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn whoami_handler(
    axum::Extension(claims): axum::Extension<Claims>,
) -> impl IntoResponse {
    match claims.role {
        ROLE_ADMIN => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "¡Bienvenido, administrador!"})),
        )
            .into_response(),
        ROLE_CUSTOMER => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "¡Bienvenido, usuario!"})),
        )
            .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "Rol no reconocido"})),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: 7,
            name: "Ana".into(),
            paternal_surname: "García".into(),
            maternal_surname: "López".into(),
            address: "Calle 1".into(),
            email: "ana@example.com".into(),
            password_hash: String::new(),
            phone: "+525512345678".into(),
            payment: "paypal".into(),
            role: ROLE_ADMIN,
            remember_token: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let cfg = JwtConfig {
            secret: "test-secret".into(),
        };
        let token = issue_token(&cfg, &test_user()).unwrap();
        let claims = verify_token(&cfg, &token).unwrap();
        assert_eq!(claims.sub, "ana@example.com");
        assert_eq!(claims.id, 7);
        assert_eq!(claims.role, ROLE_ADMIN);
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let cfg = JwtConfig {
            secret: "test-secret".into(),
        };
        let other = JwtConfig {
            secret: "another-secret".into(),
        };
        let token = issue_token(&cfg, &test_user()).unwrap();
        assert!(verify_token(&other, &token).is_err());
    }

    #[test]
    fn test_token_rejects_garbage() {
        let cfg = JwtConfig {
            secret: "test-secret".into(),
        };
        assert!(verify_token(&cfg, "not.a.token").is_err());
    }
}

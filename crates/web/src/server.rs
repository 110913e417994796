//! Web server implementation
//!
//! Route assembly and the public handlers (root page, health). Catalog,
//! account, and shopping handlers live in their own modules; everything
//! shares `WebServerState`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use tienda_common::{Database, Error};

use crate::auth::{self, JwtConfig};
use crate::{catalog, shopping, users};

/// Web server state
#[derive(Clone)]
pub struct WebServer {
    state: Arc<WebServerState>,
}

pub struct WebServerState {
    pub db: Database,
    pub cfg: WebServerConfig,
}

#[derive(Clone, Debug)]
pub struct WebServerConfig {
    /// JWT signing configuration for access tokens
    pub jwt: JwtConfig,
}

impl WebServer {
    pub fn new(db: Database, cfg: WebServerConfig) -> Self {
        Self {
            state: Arc::new(WebServerState { db, cfg }),
        }
    }

    /// Create router
    pub fn router(&self) -> Router {
        let state = self.state.clone();
        let auth_layer = middleware::from_fn(move |req, next| {
            let state = state.clone();
            async move { auth::require_auth(state, req, next).await }
        });

        // Protected routes (require a bearer token)
        let protected_routes = Router::new()
            .route("/auth/whoami", get(auth::whoami_handler))
            .route(
                "/wishlist",
                get(shopping::list_wishlist_handler).post(shopping::add_to_wishlist_handler),
            )
            .route(
                "/wishlist/:wishlist_id",
                delete(shopping::remove_from_wishlist_handler),
            )
            .route(
                "/carts",
                get(shopping::list_cart_handler).post(shopping::add_to_cart_handler),
            )
            .route(
                "/carts/:cart_id",
                put(shopping::update_cart_handler).delete(shopping::remove_from_cart_handler),
            )
            .route(
                "/orders",
                get(shopping::list_orders_handler).post(shopping::create_order_handler),
            )
            .route("/orders/:order_id", delete(shopping::delete_order_handler))
            .layer(auth_layer)
            .with_state(self.state.clone());

        // Public routes
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))

            // Account registration and login
            .route("/auth/register", post(auth::register_handler))
            .route("/auth/login", post(auth::login_handler))

            // User CRUD
            .route(
                "/api/users",
                get(users::list_users_handler).post(users::create_user_handler),
            )
            .route(
                "/api/users/:user_id",
                get(users::get_user_handler)
                    .patch(users::update_user_handler)
                    .delete(users::delete_user_handler),
            )

            // Catalog: brands
            .route(
                "/api/brands",
                get(catalog::list_brands_handler).post(catalog::create_brand_handler),
            )
            .route(
                "/api/brands/:brand_id",
                get(catalog::get_brand_handler)
                    .patch(catalog::update_brand_handler)
                    .delete(catalog::delete_brand_handler),
            )

            // Catalog: categories
            .route(
                "/api/categories",
                get(catalog::list_categories_handler).post(catalog::create_category_handler),
            )
            .route(
                "/api/categories/:category_id",
                get(catalog::get_category_handler)
                    .patch(catalog::update_category_handler)
                    .delete(catalog::delete_category_handler),
            )

            // Catalog: products
            .route(
                "/api/products",
                get(catalog::list_products_handler).post(catalog::create_product_handler),
            )
            .route(
                "/api/products/:product_id",
                get(catalog::get_product_handler)
                    .patch(catalog::update_product_handler)
                    .delete(catalog::delete_product_handler),
            )

            // Merge protected routes
            .merge(protected_routes)

            // Fallback
            .fallback(not_found_handler)
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the web server
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        info!("Storefront API starting on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

/// Map a store error to an HTTP response
pub(crate) fn store_error_response(err: Error) -> Response {
    match &err {
        Error::NotFound { kind } => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": format!("{} not found", kind)})),
        )
            .into_response(),
        Error::AlreadyExists { kind } => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": format!("{} already exists", kind)})),
        )
            .into_response(),
        Error::InvalidInput(message) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": message})),
        )
            .into_response(),
        Error::Unauthorized(message) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"message": message})),
        )
            .into_response(),
        Error::Forbidden(message) => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"message": message})),
        )
            .into_response(),
        _ => {
            error!("store error: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": err.to_string()})),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn root_handler() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
  <meta charset="utf-8">
  <title>Tienda</title>
</head>
<body>
  <h1 id="storefront-title">Tienda</h1>
  <p>Hello, World!</p>
</body>
</html>
"#,
    )
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tienda-web"
    }))
}

async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"message": "Not found"})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let db = Database::open_memory().unwrap();
        let server = WebServer::new(
            db,
            WebServerConfig {
                jwt: JwtConfig {
                    secret: "test-secret".into(),
                },
            },
        );
        server.router()
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn sample_user(email: &str, role: i64) -> Value {
        json!({
            "name": "Ana",
            "paternal_surname": "García",
            "maternal_surname": "López",
            "address": "Av. Reforma 100",
            "email": email,
            "password": "password123",
            "confirm_password": "password123",
            "phone": "+525512345678",
            "payment": "credit_card",
            "role": role,
        })
    }

    async fn login(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": email, "password": "password123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn seed_product(app: &Router, name: &str, price: f64, stock: i64) -> i64 {
        let (status, category) = send(
            app,
            "POST",
            "/api/categories",
            None,
            Some(json!({"name": format!("cat-{}", name), "description": "test"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, brand) = send(
            app,
            "POST",
            "/api/brands",
            None,
            Some(json!({
                "name": format!("brand-{}", name),
                "address": "Av. Juárez 5",
                "phone": "+525598765432",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, product) = send(
            app,
            "POST",
            "/api/products",
            None,
            Some(json!({
                "name": name,
                "price": price,
                "description": "test product",
                "stock": stock,
                "category_id": category["id"],
                "brand_id": brand["id"],
                "img": "https://example.com/p.jpg",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        product["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let app = test_router();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("<title>Tienda</title>"));
        assert!(html.contains("Hello, World!"));

        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_register_login_whoami() {
        let app = test_router();

        let (status, body) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(sample_user("admin@example.com", 1)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Usuario registrado exitosamente");

        // Duplicate registration is rejected
        let (status, body) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(sample_user("admin@example.com", 1)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "El usuario ya está registrado");

        // Wrong password
        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "admin@example.com", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Credenciales incorrectas");

        let token = login(&app, "admin@example.com").await;
        let (status, body) = send(&app, "GET", "/auth/whoami", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "¡Bienvenido, administrador!");

        // No token
        let (status, _) = send(&app, "GET", "/auth/whoami", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let app = test_router();

        let mut missing_phone = sample_user("missing@example.com", 0);
        missing_phone["phone"] = json!("");
        let (status, body) = send(&app, "POST", "/auth/register", None, Some(missing_phone)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("Los siguientes campos son requeridos"));

        let mut bad_email = sample_user("not-an-email", 0);
        bad_email["email"] = json!("not-an-email");
        let (status, body) = send(&app, "POST", "/auth/register", None, Some(bad_email)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Formato de correo electrónico inválido");

        let mut mismatched = sample_user("mismatch@example.com", 0);
        mismatched["confirm_password"] = json!("different123");
        let (status, body) = send(&app, "POST", "/auth/register", None, Some(mismatched)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Las contraseñas no coinciden");
    }

    #[tokio::test]
    async fn test_category_crud() {
        let app = test_router();

        let (status, body) = send(
            &app,
            "POST",
            "/api/categories",
            None,
            Some(json!({"name": "Consolas", "description": "Videojuegos"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Category created successfully");
        let id = body["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            "/api/categories",
            None,
            Some(json!({"name": "Consolas", "description": "Otra vez"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Category already exists");

        let (status, body) = send(&app, "GET", "/api/categories", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "GET", &format!("/api/categories/{}", id), None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/api/categories/999", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Category not found");
    }

    #[tokio::test]
    async fn test_product_validation() {
        let app = test_router();

        // Unknown category
        let (status, body) = send(
            &app,
            "POST",
            "/api/products",
            None,
            Some(json!({
                "name": "Orphan",
                "price": 10.0,
                "description": "no category",
                "stock": 1,
                "category_id": 999,
                "brand_id": 999,
                "img": "https://example.com/p.jpg",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Category not found");

        // Bad price
        let (status, body) = send(
            &app,
            "POST",
            "/api/products",
            None,
            Some(json!({
                "name": "Gratis",
                "price": 0.0,
                "description": "free",
                "stock": 1,
                "category_id": 1,
                "brand_id": 1,
                "img": "https://example.com/p.jpg",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Price must be greater than 0");

        // Duplicate name
        let id = seed_product(&app, "Xbox Series S", 5999.0, 10).await;
        assert!(id > 0);
        let (status, body) = send(
            &app,
            "POST",
            "/api/products",
            None,
            Some(json!({
                "name": "Xbox Series S",
                "price": 5999.0,
                "description": "again",
                "stock": 10,
                "category_id": 1,
                "brand_id": 1,
                "img": "https://example.com/p.jpg",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Product already exists");
    }

    #[tokio::test]
    async fn test_cart_and_order_flow() {
        let app = test_router();

        let (status, _) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(sample_user("shopper@example.com", 0)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let token = login(&app, "shopper@example.com").await;

        // Shopping endpoints reject anonymous requests
        let (status, _) = send(&app, "GET", "/carts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let product_id = seed_product(&app, "Control Inalámbrico", 1499.0, 5).await;

        // Order with an empty cart
        let (status, body) = send(&app, "POST", "/orders", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Your cart is empty");

        let (status, body) = send(
            &app,
            "POST",
            "/carts",
            Some(&token),
            Some(json!({"product_id": product_id, "quantity": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Product added to cart");

        let (status, body) = send(&app, "GET", "/carts", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let lines = body["data"].as_array().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["product_name"], "Control Inalámbrico");
        assert_eq!(lines[0]["total"], 2998.0);

        let (status, body) = send(&app, "POST", "/orders", Some(&token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Order created successfully");
        assert_eq!(body["total_amount"], 2998.0);
        let order_id = body["order_id"].as_i64().unwrap();

        // The cart is emptied by the order
        let (status, body) = send(&app, "GET", "/carts", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Your cart is empty");

        let (status, body) = send(&app, "GET", "/orders", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/orders/{}", order_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Order deleted successfully");
    }

    #[tokio::test]
    async fn test_wishlist_flow() {
        let app = test_router();

        let (status, _) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(sample_user("wisher@example.com", 0)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let token = login(&app, "wisher@example.com").await;
        let product_id = seed_product(&app, "Audífonos", 899.0, 20).await;

        let (status, body) = send(
            &app,
            "POST",
            "/wishlist",
            Some(&token),
            Some(json!({"product_id": product_id})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Product added to your wishlist.");

        let (status, body) = send(
            &app,
            "POST",
            "/wishlist",
            Some(&token),
            Some(json!({"product_id": product_id})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "The product is already on your wishlist.");

        let (status, body) = send(&app, "GET", "/wishlist", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body["wishlist"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        let wishlist_id = entries[0]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/wishlist/{}", wishlist_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Product removed from wishlist.");

        let (status, body) = send(&app, "GET", "/wishlist", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Your wishlist is empty.");
    }
}

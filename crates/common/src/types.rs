//! Core domain types for the Tienda storefront

use serde::{Deserialize, Serialize};

/// Customer role for ordinary accounts
pub const ROLE_CUSTOMER: i64 = 0;
/// Administrator role
pub const ROLE_ADMIN: i64 = 1;

/// A registered store user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub address: String,
    pub email: String,
    /// PBKDF2 password hash, never serialized into API responses
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone: String,
    pub payment: String,
    pub role: i64,
    pub remember_token: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Payload for creating or replacing a user account.
///
/// The same shape serves `POST /auth/register` and the user CRUD endpoints;
/// `password` is hashed before it reaches the database.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub name: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub address: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub payment: String,
    #[serde(default)]
    pub role: Option<i64>,
    #[serde(default)]
    pub remember_token: Option<String>,
}

/// A validated user ready for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub address: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub payment: String,
    pub role: i64,
    pub remember_token: Option<String>,
}

/// A product brand (seller identity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandPayload {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// A product category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    pub description: String,
}

/// A catalog product, with its category and brand names resolved for reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub stock: i64,
    pub img: String,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub category_name: Option<String>,
    pub brand_name: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub stock: i64,
    pub category_id: i64,
    pub brand_id: i64,
    pub img: String,
}

/// A row in a user's shopping cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price captured when the product was added
    pub price: f64,
    pub total: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A cart row joined with product details, as returned by `GET /carts`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: i64,
    pub product_name: String,
    pub product_img: String,
    pub quantity: i64,
    pub price: f64,
    pub total: f64,
}

/// A wishlist row joined with the product name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub created_at: i64,
}

/// A placed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub total_amount: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

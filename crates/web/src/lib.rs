//! Tienda web service
//!
//! axum REST API over the SQLite store: accounts and JWT auth, catalog
//! (brands, categories, products), and per-user shopping state (cart,
//! wishlist, orders).

pub mod auth;
pub mod catalog;
pub mod server;
pub mod shopping;
pub mod users;

pub use server::{WebServer, WebServerConfig};

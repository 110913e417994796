//! Tienda Common Library
//!
//! Shared types, validation, and persistence for the Tienda storefront platform.

pub mod db;
pub mod error;
pub mod password;
pub mod types;
pub mod validate;

// Re-export commonly used types
pub use db::Database;
pub use error::{Error, Result};
pub use types::*;

/// Tienda version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store path
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".tienda")
}

/// Default database path
pub fn default_db_path() -> std::path::PathBuf {
    default_store_path().join("store.db")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}

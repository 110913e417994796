//! SQLite persistence for the Tienda store
//!
//! A single shared connection behind a mutex, WAL mode, and typed accessors
//! per entity. Monetary totals on cart rows are captured at add time; order
//! totals are computed from the cart rows, not from the product catalog.

use crate::{Error, Result};
use crate::types::*;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Database wrapper for store persistence
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

impl Database {
    /// Open or create the database at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;

        // WAL for concurrent readers; enforce foreign keys
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;

        info!("Opened database at {:?}", path.as_ref());
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                paternal_surname TEXT NOT NULL,
                maternal_surname TEXT NOT NULL,
                address TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                phone TEXT NOT NULL,
                payment TEXT NOT NULL,
                role INTEGER NOT NULL DEFAULT 0,
                remember_token TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

            CREATE TABLE IF NOT EXISTS brands (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                phone TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                price REAL NOT NULL,
                description TEXT NOT NULL,
                stock INTEGER NOT NULL,
                img TEXT NOT NULL,
                category_id INTEGER REFERENCES categories(id),
                brand_id INTEGER REFERENCES brands(id),
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_products_category ON products(category_id);
            CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand_id);

            CREATE TABLE IF NOT EXISTS carts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                product_id INTEGER NOT NULL REFERENCES products(id),
                quantity INTEGER NOT NULL,
                price REAL NOT NULL,
                total REAL NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_carts_user ON carts(user_id);

            CREATE TABLE IF NOT EXISTS wishlists (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                product_id INTEGER NOT NULL REFERENCES products(id),
                created_at INTEGER NOT NULL,
                UNIQUE(user_id, product_id)
            );

            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                total_amount REAL NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id);

            CREATE TABLE IF NOT EXISTS order_products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                product_id INTEGER NOT NULL REFERENCES products(id),
                quantity INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_order_products_order ON order_products(order_id);
            "#,
        )?;

        debug!("Database schema initialized");
        Ok(())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub fn create_user(&self, user: &NewUser) -> Result<User> {
        let conn = self.conn.lock();
        let now = now_epoch();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![user.email],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(Error::AlreadyExists { kind: "User" });
        }

        conn.execute(
            "INSERT INTO users (name, paternal_surname, maternal_surname, address, email, \
             password_hash, phone, payment, role, remember_token, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                user.name,
                user.paternal_surname,
                user.maternal_surname,
                user.address,
                user.email,
                user.password_hash,
                user.phone,
                user.payment,
                user.role,
                user.remember_token,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Created user {} ({})", id, user.email);

        Self::get_user_locked(&conn, id)?.ok_or_else(|| Error::Internal("user vanished after insert".into()))
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock();
        Self::get_user_locked(&conn, id)
    }

    fn get_user_locked(conn: &Connection, id: i64) -> Result<Option<User>> {
        let user = conn
            .query_row(
                "SELECT id, name, paternal_surname, maternal_surname, address, email, \
                 password_hash, phone, payment, role, remember_token, created_at, updated_at \
                 FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let user = conn
            .query_row(
                "SELECT id, name, paternal_surname, maternal_surname, address, email, \
                 password_hash, phone, payment, role, remember_token, created_at, updated_at \
                 FROM users WHERE email = ?1",
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, paternal_surname, maternal_surname, address, email, \
             password_hash, phone, payment, role, remember_token, created_at, updated_at \
             FROM users ORDER BY id",
        )?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn update_user(&self, id: i64, user: &NewUser) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let affected = conn.execute(
            "UPDATE users SET name = ?1, paternal_surname = ?2, maternal_surname = ?3, \
             address = ?4, email = ?5, password_hash = ?6, phone = ?7, payment = ?8, \
             role = ?9, remember_token = ?10, updated_at = ?11 WHERE id = ?12",
            params![
                user.name,
                user.paternal_surname,
                user.maternal_surname,
                user.address,
                user.email,
                user.password_hash,
                user.phone,
                user.payment,
                user.role,
                user.remember_token,
                now_epoch(),
                id,
            ],
        )?;
        if affected == 0 {
            return Ok(None);
        }
        Self::get_user_locked(&conn, id)
    }

    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    // ========================================================================
    // Brands
    // ========================================================================

    pub fn create_brand(&self, brand: &BrandPayload) -> Result<Brand> {
        let conn = self.conn.lock();
        let now = now_epoch();
        conn.execute(
            "INSERT INTO brands (name, address, phone, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![brand.name, brand.address, brand.phone, now],
        )?;
        let id = conn.last_insert_rowid();
        Self::get_brand_locked(&conn, id)?.ok_or_else(|| Error::Internal("brand vanished after insert".into()))
    }

    pub fn get_brand(&self, id: i64) -> Result<Option<Brand>> {
        let conn = self.conn.lock();
        Self::get_brand_locked(&conn, id)
    }

    fn get_brand_locked(conn: &Connection, id: i64) -> Result<Option<Brand>> {
        let brand = conn
            .query_row(
                "SELECT id, name, address, phone, created_at, updated_at FROM brands WHERE id = ?1",
                params![id],
                brand_from_row,
            )
            .optional()?;
        Ok(brand)
    }

    pub fn list_brands(&self) -> Result<Vec<Brand>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, address, phone, created_at, updated_at FROM brands ORDER BY id",
        )?;
        let brands = stmt
            .query_map([], brand_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(brands)
    }

    pub fn update_brand(&self, id: i64, brand: &BrandPayload) -> Result<Option<Brand>> {
        let conn = self.conn.lock();
        let affected = conn.execute(
            "UPDATE brands SET name = ?1, address = ?2, phone = ?3, updated_at = ?4 WHERE id = ?5",
            params![brand.name, brand.address, brand.phone, now_epoch(), id],
        )?;
        if affected == 0 {
            return Ok(None);
        }
        Self::get_brand_locked(&conn, id)
    }

    pub fn delete_brand(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let affected = conn.execute("DELETE FROM brands WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    // ========================================================================
    // Categories
    // ========================================================================

    pub fn create_category(&self, category: &CategoryPayload) -> Result<Category> {
        let conn = self.conn.lock();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE name = ?1",
                params![category.name],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(Error::AlreadyExists { kind: "Category" });
        }

        let now = now_epoch();
        conn.execute(
            "INSERT INTO categories (name, description, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?3)",
            params![category.name, category.description, now],
        )?;
        let id = conn.last_insert_rowid();
        Self::get_category_locked(&conn, id)?
            .ok_or_else(|| Error::Internal("category vanished after insert".into()))
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn.lock();
        Self::get_category_locked(&conn, id)
    }

    fn get_category_locked(conn: &Connection, id: i64) -> Result<Option<Category>> {
        let category = conn
            .query_row(
                "SELECT id, name, description, created_at, updated_at FROM categories WHERE id = ?1",
                params![id],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at, updated_at FROM categories ORDER BY id",
        )?;
        let categories = stmt
            .query_map([], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    /// Partial update: blank fields leave the stored value untouched
    pub fn update_category(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Category>> {
        let conn = self.conn.lock();
        if Self::get_category_locked(&conn, id)?.is_none() {
            return Ok(None);
        }
        if let Some(name) = name {
            conn.execute(
                "UPDATE categories SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, now_epoch(), id],
            )?;
        }
        if let Some(description) = description {
            conn.execute(
                "UPDATE categories SET description = ?1, updated_at = ?2 WHERE id = ?3",
                params![description, now_epoch(), id],
            )?;
        }
        Self::get_category_locked(&conn, id)
    }

    pub fn delete_category(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let affected = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    // ========================================================================
    // Products
    // ========================================================================

    pub fn create_product(&self, product: &ProductPayload) -> Result<Product> {
        let conn = self.conn.lock();

        if Self::get_category_locked(&conn, product.category_id)?.is_none() {
            return Err(Error::NotFound { kind: "Category" });
        }
        if Self::get_brand_locked(&conn, product.brand_id)?.is_none() {
            return Err(Error::NotFound { kind: "Brand" });
        }
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM products WHERE name = ?1",
                params![product.name],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(Error::AlreadyExists { kind: "Product" });
        }

        let now = now_epoch();
        conn.execute(
            "INSERT INTO products (name, price, description, stock, img, category_id, brand_id, \
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                product.name,
                product.price,
                product.description,
                product.stock,
                product.img,
                product.category_id,
                product.brand_id,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Self::get_product_locked(&conn, id)?
            .ok_or_else(|| Error::Internal("product vanished after insert".into()))
    }

    pub fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let conn = self.conn.lock();
        Self::get_product_locked(&conn, id)
    }

    fn get_product_locked(conn: &Connection, id: i64) -> Result<Option<Product>> {
        let product = conn
            .query_row(
                "SELECT p.id, p.name, p.price, p.description, p.stock, p.img, \
                 p.category_id, p.brand_id, c.name, b.name, p.created_at, p.updated_at \
                 FROM products p \
                 LEFT JOIN categories c ON c.id = p.category_id \
                 LEFT JOIN brands b ON b.id = p.brand_id \
                 WHERE p.id = ?1",
                params![id],
                product_from_row,
            )
            .optional()?;
        Ok(product)
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.price, p.description, p.stock, p.img, \
             p.category_id, p.brand_id, c.name, b.name, p.created_at, p.updated_at \
             FROM products p \
             LEFT JOIN categories c ON c.id = p.category_id \
             LEFT JOIN brands b ON b.id = p.brand_id \
             ORDER BY p.id",
        )?;
        let products = stmt
            .query_map([], product_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(products)
    }

    pub fn update_product(&self, id: i64, product: &ProductPayload) -> Result<Option<Product>> {
        let conn = self.conn.lock();
        let affected = conn.execute(
            "UPDATE products SET name = ?1, price = ?2, description = ?3, stock = ?4, \
             img = ?5, category_id = ?6, brand_id = ?7, updated_at = ?8 WHERE id = ?9",
            params![
                product.name,
                product.price,
                product.description,
                product.stock,
                product.img,
                product.category_id,
                product.brand_id,
                now_epoch(),
                id,
            ],
        )?;
        if affected == 0 {
            return Ok(None);
        }
        Self::get_product_locked(&conn, id)
    }

    pub fn delete_product(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let affected = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    // ========================================================================
    // Cart
    // ========================================================================

    /// Add a product to the user's cart. An existing row for the same
    /// product accumulates quantity at the price captured when the row was
    /// first created.
    pub fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem> {
        let conn = self.conn.lock();

        let product = Self::get_product_locked(&conn, product_id)?
            .ok_or(Error::NotFound { kind: "Product" })?;

        let existing: Option<(i64, i64, f64)> = conn
            .query_row(
                "SELECT id, quantity, price FROM carts WHERE user_id = ?1 AND product_id = ?2",
                params![user_id, product_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let id = match existing {
            Some((id, current_quantity, unit_price)) => {
                let new_quantity = current_quantity + quantity;
                conn.execute(
                    "UPDATE carts SET quantity = ?1, total = ?2, updated_at = ?3 WHERE id = ?4",
                    params![new_quantity, unit_price * new_quantity as f64, now_epoch(), id],
                )?;
                id
            }
            None => {
                let now = now_epoch();
                conn.execute(
                    "INSERT INTO carts (user_id, product_id, quantity, price, total, \
                     created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![
                        user_id,
                        product_id,
                        quantity,
                        product.price,
                        product.price * quantity as f64,
                        now,
                    ],
                )?;
                conn.last_insert_rowid()
            }
        };

        Self::get_cart_item_locked(&conn, id)?
            .ok_or_else(|| Error::Internal("cart item vanished after write".into()))
    }

    fn get_cart_item_locked(conn: &Connection, id: i64) -> Result<Option<CartItem>> {
        let item = conn
            .query_row(
                "SELECT id, user_id, product_id, quantity, price, total, created_at, updated_at \
                 FROM carts WHERE id = ?1",
                params![id],
                cart_item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    /// Cart rows joined with product details, for display
    pub fn list_cart(&self, user_id: i64) -> Result<Vec<CartLine>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT c.id, p.name, p.img, c.quantity, c.price, c.total \
             FROM carts c JOIN products p ON p.id = c.product_id \
             WHERE c.user_id = ?1 ORDER BY c.id",
        )?;
        let lines = stmt
            .query_map(params![user_id], |row| {
                Ok(CartLine {
                    id: row.get(0)?,
                    product_name: row.get(1)?,
                    product_img: row.get(2)?,
                    quantity: row.get(3)?,
                    price: row.get(4)?,
                    total: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lines)
    }

    /// Replace the quantity of a cart row, bounded by the product's stock
    pub fn set_cart_quantity(&self, cart_id: i64, user_id: i64, quantity: i64) -> Result<CartItem> {
        let conn = self.conn.lock();

        let row: Option<(i64, f64)> = conn
            .query_row(
                "SELECT product_id, price FROM carts WHERE id = ?1 AND user_id = ?2",
                params![cart_id, user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (product_id, unit_price) = row.ok_or(Error::NotFound { kind: "Cart item" })?;

        let stock: i64 = conn.query_row(
            "SELECT stock FROM products WHERE id = ?1",
            params![product_id],
            |row| row.get(0),
        )?;
        if quantity > stock {
            return Err(Error::invalid("Quantity exceeds available stock"));
        }

        conn.execute(
            "UPDATE carts SET quantity = ?1, total = ?2, updated_at = ?3 WHERE id = ?4",
            params![quantity, unit_price * quantity as f64, now_epoch(), cart_id],
        )?;

        Self::get_cart_item_locked(&conn, cart_id)?
            .ok_or_else(|| Error::Internal("cart item vanished after write".into()))
    }

    pub fn remove_cart_item(&self, cart_id: i64, user_id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let affected = conn.execute(
            "DELETE FROM carts WHERE id = ?1 AND user_id = ?2",
            params![cart_id, user_id],
        )?;
        Ok(affected > 0)
    }

    // ========================================================================
    // Wishlist
    // ========================================================================

    pub fn add_to_wishlist(&self, user_id: i64, product_id: i64) -> Result<i64> {
        let conn = self.conn.lock();

        if Self::get_product_locked(&conn, product_id)?.is_none() {
            return Err(Error::NotFound { kind: "Product" });
        }
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM wishlists WHERE user_id = ?1 AND product_id = ?2",
                params![user_id, product_id],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(Error::AlreadyExists { kind: "Wishlist item" });
        }

        conn.execute(
            "INSERT INTO wishlists (user_id, product_id, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, product_id, now_epoch()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_wishlist(&self, user_id: i64) -> Result<Vec<WishlistEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT w.id, w.product_id, p.name, w.created_at \
             FROM wishlists w JOIN products p ON p.id = w.product_id \
             WHERE w.user_id = ?1 ORDER BY w.id",
        )?;
        let entries = stmt
            .query_map(params![user_id], |row| {
                Ok(WishlistEntry {
                    id: row.get(0)?,
                    product_id: row.get(1)?,
                    product_name: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn remove_wishlist_item(&self, wishlist_id: i64, user_id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let affected = conn.execute(
            "DELETE FROM wishlists WHERE id = ?1 AND user_id = ?2",
            params![wishlist_id, user_id],
        )?;
        Ok(affected > 0)
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// Turn the user's cart into an order atomically: the order total is the
    /// sum of cart row totals, each cart row becomes an order line, and the
    /// cart is emptied.
    pub fn create_order_from_cart(&self, user_id: i64) -> Result<Order> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let now = now_epoch();

        let cart_rows: Vec<(i64, i64, f64)> = {
            let mut stmt = tx.prepare(
                "SELECT product_id, quantity, total FROM carts WHERE user_id = ?1",
            )?;
            let rows = stmt
                .query_map(params![user_id], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        if cart_rows.is_empty() {
            return Err(Error::invalid("Your cart is empty"));
        }

        let total_amount: f64 = cart_rows.iter().map(|(_, _, total)| total).sum();

        tx.execute(
            "INSERT INTO orders (user_id, total_amount, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?3)",
            params![user_id, total_amount, now],
        )?;
        let order_id = tx.last_insert_rowid();

        for (product_id, quantity, _) in &cart_rows {
            tx.execute(
                "INSERT INTO order_products (order_id, product_id, quantity, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![order_id, product_id, quantity, now],
            )?;
        }

        tx.execute("DELETE FROM carts WHERE user_id = ?1", params![user_id])?;
        tx.commit()?;

        debug!("Created order {} for user {} (total {})", order_id, user_id, total_amount);
        Ok(Order {
            id: order_id,
            user_id,
            total_amount,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn list_orders(&self, user_id: i64) -> Result<Vec<Order>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, total_amount, created_at, updated_at \
             FROM orders WHERE user_id = ?1 ORDER BY id",
        )?;
        let orders = stmt
            .query_map(params![user_id], |row| {
                Ok(Order {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    total_amount: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(orders)
    }

    pub fn delete_order(&self, order_id: i64, user_id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM order_products WHERE order_id = \
             (SELECT id FROM orders WHERE id = ?1 AND user_id = ?2)",
            params![order_id, user_id],
        )?;
        let affected = conn.execute(
            "DELETE FROM orders WHERE id = ?1 AND user_id = ?2",
            params![order_id, user_id],
        )?;
        Ok(affected > 0)
    }
}

// ============================================================================
// Row mappers
// ============================================================================

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        paternal_surname: row.get(2)?,
        maternal_surname: row.get(3)?,
        address: row.get(4)?,
        email: row.get(5)?,
        password_hash: row.get(6)?,
        phone: row.get(7)?,
        payment: row.get(8)?,
        role: row.get(9)?,
        remember_token: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn brand_from_row(row: &Row<'_>) -> rusqlite::Result<Brand> {
    Ok(Brand {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        phone: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        description: row.get(3)?,
        stock: row.get(4)?,
        img: row.get(5)?,
        category_id: row.get(6)?,
        brand_id: row.get(7)?,
        category_name: row.get(8)?,
        brand_name: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn cart_item_from_row(row: &Row<'_>) -> rusqlite::Result<CartItem> {
    Ok(CartItem {
        id: row.get(0)?,
        user_id: row.get(1)?,
        product_id: row.get(2)?,
        quantity: row.get(3)?,
        price: row.get(4)?,
        total: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_memory().unwrap()
    }

    fn seed_user(db: &Database, email: &str) -> User {
        db.create_user(&NewUser {
            name: "Test".into(),
            paternal_surname: "Doe".into(),
            maternal_surname: "Smith".into(),
            address: "123 Main St".into(),
            email: email.into(),
            password_hash: "pbkdf2-sha256$1$00$00".into(),
            phone: "+525512345678".into(),
            payment: "credit_card".into(),
            role: ROLE_CUSTOMER,
            remember_token: None,
        })
        .unwrap()
    }

    fn seed_product(db: &Database, name: &str, price: f64, stock: i64) -> Product {
        let category = db
            .create_category(&CategoryPayload {
                name: format!("cat-{}", name),
                description: "test category".into(),
            })
            .unwrap();
        let brand = db
            .create_brand(&BrandPayload {
                name: format!("brand-{}", name),
                address: "Av. Reforma 1".into(),
                phone: "+525598765432".into(),
            })
            .unwrap();
        db.create_product(&ProductPayload {
            name: name.into(),
            price,
            description: "test product".into(),
            stock,
            category_id: category.id,
            brand_id: brand.id,
            img: "https://example.com/p.jpg".into(),
        })
        .unwrap()
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        {
            let db = Database::open(&path).unwrap();
            seed_user(&db, "disk@example.com");
        }
        let db = Database::open(&path).unwrap();
        assert!(db.get_user_by_email("disk@example.com").unwrap().is_some());
    }

    #[test]
    fn test_user_roundtrip() {
        let db = test_db();
        let user = seed_user(&db, "roundtrip@example.com");
        let fetched = db.get_user(user.id).unwrap().unwrap();
        assert_eq!(fetched.email, "roundtrip@example.com");
        assert_eq!(
            db.get_user_by_email("roundtrip@example.com").unwrap().unwrap().id,
            user.id
        );
        assert!(db.delete_user(user.id).unwrap());
        assert!(db.get_user(user.id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let db = test_db();
        seed_user(&db, "dup@example.com");
        let err = db
            .create_user(&NewUser {
                name: "Other".into(),
                paternal_surname: "Doe".into(),
                maternal_surname: "Smith".into(),
                address: "456 Side St".into(),
                email: "dup@example.com".into(),
                password_hash: "pbkdf2-sha256$1$00$00".into(),
                phone: "+525512345678".into(),
                payment: "paypal".into(),
                role: ROLE_CUSTOMER,
                remember_token: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { kind: "User" }));
    }

    #[test]
    fn test_category_duplicate_name_rejected() {
        let db = test_db();
        let payload = CategoryPayload {
            name: "Consolas".into(),
            description: "Videojuegos".into(),
        };
        db.create_category(&payload).unwrap();
        assert!(matches!(
            db.create_category(&payload).unwrap_err(),
            Error::AlreadyExists { kind: "Category" }
        ));
    }

    #[test]
    fn test_product_requires_category_and_brand() {
        let db = test_db();
        let err = db
            .create_product(&ProductPayload {
                name: "Orphan".into(),
                price: 10.0,
                description: "no parents".into(),
                stock: 1,
                category_id: 999,
                brand_id: 999,
                img: "https://example.com/p.jpg".into(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "Category" }));
    }

    #[test]
    fn test_product_joins_category_and_brand_names() {
        let db = test_db();
        let product = seed_product(&db, "Xbox Series S", 5999.0, 10);
        let fetched = db.get_product(product.id).unwrap().unwrap();
        assert_eq!(fetched.category_name.as_deref(), Some("cat-Xbox Series S"));
        assert_eq!(fetched.brand_name.as_deref(), Some("brand-Xbox Series S"));
    }

    #[test]
    fn test_cart_accumulates_quantity() {
        let db = test_db();
        let user = seed_user(&db, "cart@example.com");
        let product = seed_product(&db, "Control", 100.0, 50);

        let first = db.add_to_cart(user.id, product.id, 2).unwrap();
        assert_eq!(first.quantity, 2);
        assert_eq!(first.total, 200.0);

        let second = db.add_to_cart(user.id, product.id, 3).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.quantity, 5);
        assert_eq!(second.total, 500.0);

        let lines = db.list_cart(user.id).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_name, "Control");
    }

    #[test]
    fn test_cart_quantity_bounded_by_stock() {
        let db = test_db();
        let user = seed_user(&db, "stock@example.com");
        let product = seed_product(&db, "Limited", 100.0, 3);
        let item = db.add_to_cart(user.id, product.id, 1).unwrap();

        let err = db.set_cart_quantity(item.id, user.id, 10).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let updated = db.set_cart_quantity(item.id, user.id, 3).unwrap();
        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.total, 300.0);
    }

    #[test]
    fn test_wishlist_rejects_duplicates() {
        let db = test_db();
        let user = seed_user(&db, "wish@example.com");
        let product = seed_product(&db, "Deseo", 42.0, 5);

        db.add_to_wishlist(user.id, product.id).unwrap();
        assert!(matches!(
            db.add_to_wishlist(user.id, product.id).unwrap_err(),
            Error::AlreadyExists { kind: "Wishlist item" }
        ));

        let entries = db.list_wishlist(user.id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].product_name, "Deseo");
    }

    #[test]
    fn test_order_from_cart_totals_and_clears() {
        let db = test_db();
        let user = seed_user(&db, "order@example.com");
        let product_a = seed_product(&db, "A", 100.0, 10);
        let product_b = seed_product(&db, "B", 50.0, 10);
        db.add_to_cart(user.id, product_a.id, 2).unwrap();
        db.add_to_cart(user.id, product_b.id, 1).unwrap();

        let order = db.create_order_from_cart(user.id).unwrap();
        assert_eq!(order.total_amount, 250.0);
        assert!(db.list_cart(user.id).unwrap().is_empty());

        let orders = db.list_orders(user.id).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, order.id);
    }

    #[test]
    fn test_order_from_empty_cart_rejected() {
        let db = test_db();
        let user = seed_user(&db, "empty@example.com");
        assert!(matches!(
            db.create_order_from_cart(user.id).unwrap_err(),
            Error::InvalidInput(_)
        ));
    }

    #[test]
    fn test_delete_order_scoped_to_user() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let other = seed_user(&db, "other@example.com");
        let product = seed_product(&db, "Mine", 10.0, 5);
        db.add_to_cart(owner.id, product.id, 1).unwrap();
        let order = db.create_order_from_cart(owner.id).unwrap();

        assert!(!db.delete_order(order.id, other.id).unwrap());
        assert!(db.delete_order(order.id, owner.id).unwrap());
        assert!(db.list_orders(owner.id).unwrap().is_empty());
    }
}

//! SQLite database for product persistence

use crate::product::{Category, Product};
use crate::{Error, Result};
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a `DATABASE_URI` points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUri {
    Memory,
    File(PathBuf),
    /// `postgres://` or `postgresql://`; recognised but not served by this store
    Postgres(String),
}

impl DatabaseUri {
    /// Parse `sqlite::memory:`, `:memory:`, `sqlite://<path>`, `sqlite:<path>`
    /// or a bare filesystem path. Postgres URIs are recognised, any other
    /// scheme is rejected.
    pub fn parse(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        if uri.starts_with("postgres://") || uri.starts_with("postgresql://") {
            return Ok(Self::Postgres(uri.to_string()));
        }
        if matches!(uri, ":memory:" | "sqlite::memory:" | "sqlite://:memory:") {
            return Ok(Self::Memory);
        }
        if let Some(path) = uri.strip_prefix("sqlite://").or_else(|| uri.strip_prefix("sqlite:")) {
            if path.is_empty() {
                return Err(Error::UnsupportedDatabase(uri.to_string()));
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        if uri.is_empty() || uri.contains("://") {
            return Err(Error::UnsupportedDatabase(uri.to_string()));
        }
        Ok(Self::File(PathBuf::from(uri)))
    }
}

/// Optional list filters, combined with AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub available: Option<bool>,
}

/// Database wrapper for product persistence
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        info!("Opened database at {:?}", path.as_ref());
        Ok(db)
    }

    /// Open in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Open whatever a `DATABASE_URI` value points at. Postgres URIs fail
    /// with `UnsupportedDatabase`.
    pub fn open_uri(uri: &str) -> Result<Self> {
        match DatabaseUri::parse(uri)? {
            DatabaseUri::Memory => Self::open_memory(),
            DatabaseUri::File(path) => Self::open(path),
            DatabaseUri::Postgres(uri) => Err(Error::UnsupportedDatabase(uri)),
        }
    }

    /// Open a `DATABASE_URI` for a test run. A Postgres URI, the deployed
    /// service's usual setting, gets an in-memory store and a warning instead
    /// of an error.
    pub fn open_for_tests(uri: &str) -> Result<Self> {
        match DatabaseUri::parse(uri)? {
            DatabaseUri::Postgres(_) => {
                warn!("DATABASE_URI names a Postgres server; using an in-memory SQLite store");
                Self::open_memory()
            }
            _ => Self::open_uri(uri),
        }
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                price TEXT NOT NULL,
                available INTEGER NOT NULL,
                category TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_products_name ON products(name);
            CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
            "#,
        )?;

        debug!("Database schema initialized");
        Ok(())
    }

    // ========================================================================
    // Product operations
    // ========================================================================

    /// Insert a product; the stored copy carries the assigned id
    pub fn insert_product(&self, product: &Product) -> Result<Product> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO products (name, description, price, available, category, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                product.name,
                product.description,
                product.price.to_string(),
                product.available,
                product.category.as_str(),
                now,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();

        debug!("Inserted product with id {}", id);
        Ok(product.clone().with_id(id))
    }

    /// Get a product by ID
    pub fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let conn = self.conn.lock();

        let row = conn
            .query_row(
                "SELECT id, name, description, price, available, category FROM products WHERE id = ?1",
                params![id],
                RawRow::from_row,
            )
            .optional()?;

        row.map(RawRow::parse).transpose()
    }

    /// Replace every attribute of a product. Returns `None` when the id is unknown.
    pub fn update_product(&self, id: i64, product: &Product) -> Result<Option<Product>> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        let rows = conn.execute(
            "UPDATE products
             SET name = ?1, description = ?2, price = ?3, available = ?4, category = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                product.name,
                product.description,
                product.price.to_string(),
                product.available,
                product.category.as_str(),
                now,
                id,
            ],
        )?;

        if rows == 0 {
            return Ok(None);
        }

        debug!("Updated product with id {}", id);
        Ok(Some(product.clone().with_id(id)))
    }

    /// Delete a product
    pub fn delete_product(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;

        if rows > 0 {
            debug!("Deleted product with id {}", id);
        }

        Ok(rows > 0)
    }

    /// Remove every product; returns how many rows went
    pub fn delete_all_products(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM products", [])?;
        debug!("Deleted {} product(s)", rows);
        Ok(rows)
    }

    /// List products matching a filter, oldest first
    pub fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let conn = self.conn.lock();

        let mut clauses = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();
        if let Some(name) = &filter.name {
            values.push(SqlValue::Text(name.clone()));
            clauses.push(format!("name = ?{}", values.len()));
        }
        if let Some(category) = filter.category {
            values.push(SqlValue::Text(category.as_str().to_string()));
            clauses.push(format!("category = ?{}", values.len()));
        }
        if let Some(available) = filter.available {
            values.push(SqlValue::Integer(available as i64));
            clauses.push(format!("available = ?{}", values.len()));
        }

        let mut sql =
            String::from("SELECT id, name, description, price, available, category FROM products");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), RawRow::from_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?.parse()?);
        }

        Ok(results)
    }

    /// Count stored products
    pub fn count_products(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Raw database row before parsing
struct RawRow {
    id: i64,
    name: String,
    description: String,
    price: String,
    available: bool,
    category: String,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawRow {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price: row.get(3)?,
            available: row.get(4)?,
            category: row.get(5)?,
        })
    }

    fn parse(self) -> Result<Product> {
        let price = Decimal::from_str(&self.price)
            .map_err(|e| Error::Internal(format!("stored price '{}' for product {}: {}", self.price, self.id, e)))?;
        let category = Category::from_str(&self.category)
            .map_err(|e| Error::Internal(format!("stored category for product {}: {}", self.id, e)))?;

        Ok(Product {
            id: Some(self.id),
            name: self.name,
            description: self.description,
            price,
            available: self.available,
            category,
        })
    }
}

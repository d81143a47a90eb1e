//! Product Catalog Common Library
//!
//! The product entity, its request-payload validation, and the SQLite store
//! shared by the reference catalog service and the acceptance harness.

pub mod db;
pub mod error;
pub mod factory;
pub mod product;

// Re-export commonly used types
pub use db::{Database, DatabaseUri, ProductFilter};
pub use error::{Error, Result};
pub use product::{Category, Product};

/// Catalog library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database used when `DATABASE_URI` is not set
pub const DEFAULT_DATABASE_URI: &str = "sqlite::memory:";

//! Reference Product Catalog Service
//!
//! A minimal implementation of the catalog REST contract and admin page,
//! used as the in-process target of the HTTP contract suite and the default
//! target of the acceptance runner.

pub mod config;
pub mod error;
pub mod server;
pub mod static_files;

pub use config::ServiceConfig;
pub use error::{ApiError, ApiResult};
pub use server::CatalogService;

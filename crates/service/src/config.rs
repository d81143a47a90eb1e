//! Service configuration

use std::net::SocketAddr;

use catalog_common::DEFAULT_DATABASE_URI;

/// Reference catalog service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Interface to listen on
    pub host: String,

    /// TCP port to listen on
    pub port: u16,

    /// Where products are stored (see `catalog_common::DatabaseUri`)
    pub database_uri: String,

    /// Test mode: no per-request tracing
    pub testing: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_uri: DEFAULT_DATABASE_URI.to_string(),
            testing: false,
        }
    }
}

impl ServiceConfig {
    /// Read `HOST`, `PORT` and `DATABASE_URI`, falling back to defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.host);

        let port = match std::env::var("PORT") {
            Ok(v) if !v.trim().is_empty() => v
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PORT '{}': {}", v, e))?,
            _ => defaults.port,
        };

        let database_uri = std::env::var("DATABASE_URI")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.database_uri);

        Ok(Self {
            host,
            port,
            database_uri,
            testing: false,
        })
    }

    /// Configuration for in-process tests
    pub fn testing(database_uri: impl Into<String>) -> Self {
        Self {
            database_uri: database_uri.into(),
            testing: true,
            ..Self::default()
        }
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address {}:{}: {}", self.host, self.port, e))
    }
}

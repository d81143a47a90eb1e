//! Catalog REST server implementation

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use catalog_common::{Category, Database, Product, ProductFilter};
use serde::Deserialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::{ApiError, ApiResult};
use crate::static_files;

/// Reference catalog service
#[derive(Clone)]
pub struct CatalogService {
    state: Arc<ServiceState>,
}

struct ServiceState {
    db: Database,
    cfg: ServiceConfig,
}

impl CatalogService {
    /// Create a service over an already opened database
    pub fn new(db: Database, cfg: ServiceConfig) -> Self {
        Self {
            state: Arc::new(ServiceState { db, cfg }),
        }
    }

    /// Open the configured database and build the service
    pub fn open(cfg: ServiceConfig) -> anyhow::Result<Self> {
        let db = Database::open_uri(&cfg.database_uri)?;
        Ok(Self::new(db, cfg))
    }

    /// Backing store, for tests that seed or reset it directly
    pub fn database(&self) -> &Database {
        &self.state.db
    }

    /// Create router
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/", get(index_handler))
            .route("/static/*path", get(static_handler))
            .route("/health", get(health_handler))
            .route(
                "/products",
                get(list_products_handler).post(create_product_handler),
            )
            .route(
                "/products/:product_id",
                get(get_product_handler)
                    .put(update_product_handler)
                    .delete(delete_product_handler),
            )
            .fallback(not_found_handler)
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
            .with_state(self.state.clone());

        if self.state.cfg.testing {
            router
        } else {
            router.layer(TraceLayer::new_for_http())
        }
    }

    /// Start the server on the configured address
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr: SocketAddr = self.state.cfg.listen_addr()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Catalog service listening on http://{}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Catalog service stopped");
        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn index_handler() -> Response {
    static_files::index()
}

async fn static_handler(Path(path): Path<String>) -> Response {
    static_files::serve(&path)
}

async fn health_handler(State(state): State<Arc<ServiceState>>) -> ApiResult<impl IntoResponse> {
    let products = state.db.count_products()?;
    Ok(Json(serde_json::json!({
        "message": "OK",
        "version": catalog_common::VERSION,
        "products": products,
    })))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    name: Option<String>,
    category: Option<String>,
    available: Option<String>,
}

impl ListQuery {
    /// Blank parameters mean no filter
    fn into_filter(self) -> ApiResult<ProductFilter> {
        let category = non_blank(self.category)
            .map(|c| {
                c.parse::<Category>()
                    .map_err(|e| ApiError::BadRequest(format!("Invalid attribute: {}", e)))
            })
            .transpose()?;

        let available = non_blank(self.available)
            .map(|a| match a.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(ApiError::BadRequest(format!(
                    "Invalid attribute: available must be true or false, got '{}'",
                    a
                ))),
            })
            .transpose()?;

        Ok(ProductFilter {
            name: non_blank(self.name),
            category,
            available,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn list_products_handler(
    State(state): State<Arc<ServiceState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Product>>> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    debug!("Listing products with {:?}", filter);
    let products = state.db.list_products(&filter)?;
    info!("Returning {} product(s)", products.len());
    Ok(Json(products))
}

async fn create_product_handler(
    State(state): State<Arc<ServiceState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let product = product_from_request(&headers, &body)?;
    let created = state.db.insert_product(&product)?;
    let id = created.id.ok_or_else(|| ApiError::Internal("store returned no id".into()))?;

    info!("Product with id {} created", id);
    let location = format!("/products/{}", id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    )
        .into_response())
}

async fn get_product_handler(
    State(state): State<Arc<ServiceState>>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Product>> {
    let id = parse_id(&product_id)?;
    let product = state
        .db
        .get_product(id)?
        .ok_or_else(|| ApiError::NotFound(product_id))?;
    Ok(Json(product))
}

async fn update_product_handler(
    State(state): State<Arc<ServiceState>>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Product>> {
    let id = parse_id(&product_id)?;
    check_content_type(&headers)?;

    if state.db.get_product(id)?.is_none() {
        return Err(ApiError::NotFound(product_id));
    }

    let product = product_from_request(&headers, &body)?;
    let updated = state
        .db
        .update_product(id, &product)?
        .ok_or_else(|| ApiError::NotFound(product_id))?;

    info!("Product with id {} updated", id);
    Ok(Json(updated))
}

async fn delete_product_handler(
    State(state): State<Arc<ServiceState>>,
    Path(product_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&product_id)?;
    if !state.db.delete_product(id)? {
        return Err(ApiError::NotFound(product_id));
    }
    info!("Product with id {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::RouteNotFound(uri.path().to_string())
}

// ============================================================================
// Request helpers
// ============================================================================

/// Ids that are not integers can never exist
fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse().map_err(|_| ApiError::NotFound(raw.to_string()))
}

fn check_content_type(headers: &HeaderMap) -> ApiResult<()> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case("application/json") {
        Ok(())
    } else {
        debug!("Rejecting Content-Type '{}'", content_type);
        Err(ApiError::UnsupportedMediaType)
    }
}

fn product_from_request(headers: &HeaderMap, body: &[u8]) -> ApiResult<Product> {
    check_content_type(headers)?;
    let value: serde_json::Value = serde_json::from_slice(body).map_err(|_| {
        ApiError::BadRequest("Invalid product: body of request contained bad or no data".into())
    })?;
    Ok(Product::deserialize_payload(&value)?)
}

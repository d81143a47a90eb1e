//! Product API service test suite
//!
//! Boots the catalog router in test mode over the database named by
//! `DATABASE_URI` (in-memory SQLite when unset) and drives it through an
//! in-process client. Every test empties the products table first; tests
//! sharing a database are serialised on a suite-wide lock.
//!
//! Run with: cargo test -p catalog-service --test routes

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use catalog_common::{factory, Category, Database, Product, DEFAULT_DATABASE_URI};
use catalog_service::{CatalogService, ServiceConfig};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tokio::sync::{Mutex, MutexGuard};
use tower::ServiceExt;

const BASE_URL: &str = "/products";

static SUITE_LOCK: Mutex<()> = Mutex::const_new(());

struct TestApp {
    service: CatalogService,
    _guard: MutexGuard<'static, ()>,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    fn message(&self) -> String {
        self.json()["message"].as_str().unwrap_or_default().to_string()
    }
}

async fn setup() -> TestApp {
    let guard = SUITE_LOCK.lock().await;
    let uri = std::env::var("DATABASE_URI").unwrap_or_else(|_| DEFAULT_DATABASE_URI.to_string());
    let db = Database::open_for_tests(&uri).expect("open test database");
    let service = CatalogService::new(db, ServiceConfig::testing(uri));
    service
        .database()
        .delete_all_products()
        .expect("clean up the last tests");
    TestApp {
        service,
        _guard: guard,
    }
}

impl TestApp {
    async fn request(
        &self,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: Body,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        let request = builder.body(body).unwrap();

        let response = self.service.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, Body::empty()).await
    }

    async fn post_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(
            Method::POST,
            uri,
            Some("application/json"),
            Body::from(body.to_string()),
        )
        .await
    }

    async fn put_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(
            Method::PUT,
            uri,
            Some("application/json"),
            Body::from(body.to_string()),
        )
        .await
    }

    async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None, Body::empty()).await
    }

    /// Create products through the API
    async fn create_products(&self, count: usize) -> Vec<Product> {
        let mut products = Vec::new();
        for test_product in factory::sample_products(count) {
            let response = self
                .post_json(BASE_URL, &serde_json::to_value(&test_product).unwrap())
                .await;
            assert_eq!(
                response.status,
                StatusCode::CREATED,
                "Could not create test product"
            );
            let id = response.json()["id"].as_i64().unwrap();
            products.push(test_product.with_id(id));
        }
        products
    }

    /// Create a product directly in the store
    fn insert_product(&self) -> Product {
        self.service
            .database()
            .insert_product(&factory::sample_product())
            .unwrap()
    }

    async fn product_count(&self) -> usize {
        let response = self.get(BASE_URL).await;
        assert_eq!(response.status, StatusCode::OK);
        response.json().as_array().unwrap().len()
    }
}

fn assert_matches_product(body: &Value, expected: &Product) {
    assert_eq!(body["name"], expected.name.as_str());
    assert_eq!(body["description"], expected.description.as_str());
    assert_eq!(
        Decimal::from_str(body["price"].as_str().unwrap()).unwrap(),
        expected.price
    );
    assert_eq!(body["available"], expected.available);
    assert_eq!(body["category"], expected.category.as_str());
}

// ----------------------------------------------------------
// Site
// ----------------------------------------------------------

#[tokio::test]
async fn test_index() {
    let app = setup().await;
    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("Product Catalog Administration"));
}

#[tokio::test]
async fn test_health() {
    let app = setup().await;
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], "OK");
}

#[tokio::test]
async fn test_unknown_route() {
    let app = setup().await;
    let response = app.get("/nothing/here").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["status"], 404);
}

#[tokio::test]
async fn test_method_not_allowed() {
    let app = setup().await;
    let response = app
        .request(Method::PATCH, BASE_URL, None, Body::empty())
        .await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

// ----------------------------------------------------------
// Create
// ----------------------------------------------------------

#[tokio::test]
async fn test_create_product() {
    let app = setup().await;
    let test_product = factory::sample_product();
    let response = app
        .post_json(BASE_URL, &serde_json::to_value(&test_product).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let location = response
        .headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("Location header is set");

    let new_product = response.json();
    assert_matches_product(&new_product, &test_product);
    assert_eq!(location, format!("{}/{}", BASE_URL, new_product["id"]));

    // The Location header points at the stored copy
    let response = app.get(&location).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_matches_product(&response.json(), &test_product);
}

#[tokio::test]
async fn test_create_assigns_unique_ids_and_ignores_client_id() {
    let app = setup().await;
    let mut body = serde_json::to_value(factory::sample_product()).unwrap();
    body["id"] = json!(4242);

    let first = app.post_json(BASE_URL, &body).await.json();
    let second = app.post_json(BASE_URL, &body).await.json();
    assert_ne!(first["id"], json!(4242));
    assert_ne!(first["id"], second["id"]);
}

#[tokio::test]
async fn test_create_product_with_no_name() {
    let app = setup().await;
    let product = app.create_products(1).await.remove(0);
    let mut new_product = serde_json::to_value(&product).unwrap();
    new_product.as_object_mut().unwrap().remove("name");

    let response = app.post_json(BASE_URL, &new_product).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("Invalid product: missing name"));
}

#[tokio::test]
async fn test_create_product_missing_name() {
    let app = setup().await;
    let product_data = json!({
        "description": "A test product",
        "price": "10.99",
        "available": true,
        "category": "FOOD"
    });
    let response = app.post_json(BASE_URL, &product_data).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("Invalid product: missing name"));
}

#[tokio::test]
async fn test_create_product_no_content_type() {
    let app = setup().await;
    let response = app
        .request(Method::POST, BASE_URL, None, Body::from("bad data"))
        .await;
    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_create_product_wrong_content_type() {
    let app = setup().await;
    let response = app
        .request(Method::POST, BASE_URL, Some("plain/text"), Body::from("{}"))
        .await;
    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_create_product_malformed_json() {
    let app = setup().await;
    let response = app
        .request(
            Method::POST,
            BASE_URL,
            Some("application/json"),
            Body::from("{not json"),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_product_bad_available_type() {
    let app = setup().await;
    let mut body = serde_json::to_value(factory::sample_product()).unwrap();
    body["available"] = json!("True");
    let response = app.post_json(BASE_URL, &body).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("Invalid type for boolean [available]"));
}

// ----------------------------------------------------------
// Read
// ----------------------------------------------------------

#[tokio::test]
async fn test_get_product() {
    let app = setup().await;
    let test_product = app.create_products(1).await.remove(0);
    let response = app
        .get(&format!("{}/{}", BASE_URL, test_product.id.unwrap()))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_matches_product(&response.json(), &test_product);
}

#[tokio::test]
async fn test_read_product_not_found() {
    let app = setup().await;
    for id in [0, 999] {
        let response = app.get(&format!("{}/{}", BASE_URL, id)).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response
            .message()
            .contains(&format!("Product with id {} was not found", id)));
    }
}

#[tokio::test]
async fn test_read_product_invalid_id() {
    let app = setup().await;
    let response = app.get("/products/invalid_id").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// ----------------------------------------------------------
// Update
// ----------------------------------------------------------

#[tokio::test]
async fn test_update_product() {
    let app = setup().await;
    let product = app.insert_product();

    let updated_data = json!({
        "name": "Updated Product Name",
        "description": "Updated description",
        "price": "19.99",
        "available": true,
        "category": "FOOD"
    });
    let response = app
        .put_json(&format!("{}/{}", BASE_URL, product.id.unwrap()), &updated_data)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let data = response.json();
    assert_eq!(data["id"], product.id.unwrap());
    assert_eq!(data["name"], "Updated Product Name");
    assert_eq!(data["description"], "Updated description");
    assert_eq!(data["price"], "19.99");
    assert_eq!(data["available"], true);
    assert_eq!(data["category"], "FOOD");
}

#[tokio::test]
async fn test_create_then_reprice_widget() {
    let app = setup().await;
    let mut widget = json!({
        "name": "Widget",
        "description": "d",
        "price": "19.99",
        "available": true,
        "category": "FOOD"
    });
    let response = app.post_json(BASE_URL, &widget).await;
    assert_eq!(response.status, StatusCode::CREATED);
    let created = response.json();
    assert_eq!(created["price"], "19.99");
    assert_eq!(created["category"], "FOOD");

    widget["id"] = created["id"].clone();
    widget["price"] = json!("29.99");
    let response = app
        .put_json(&format!("{}/{}", BASE_URL, created["id"]), &widget)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["price"], "29.99");
    assert_eq!(response.json()["id"], created["id"]);
}

#[tokio::test]
async fn test_update_product_not_found() {
    let app = setup().await;
    let product_data = json!({
        "name": "Updated Product",
        "description": "Updated description",
        "price": "15.99",
        "available": true,
        "category": "FOOD"
    });
    let response = app.put_json("/products/0", &product_data).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.message().contains("Product with id 0 was not found"));
}

#[tokio::test]
async fn test_update_product_invalid_data() {
    let app = setup().await;
    let product = app.insert_product();
    let response = app
        .put_json(
            &format!("{}/{}", BASE_URL, product.id.unwrap()),
            &json!({"name": 12345}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("Invalid type for string [name]"));
}

#[tokio::test]
async fn test_update_product_no_data() {
    let app = setup().await;
    let product = app.insert_product();
    let response = app
        .put_json(&format!("{}/{}", BASE_URL, product.id.unwrap()), &json!({}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("Invalid product: missing name"));
}

#[tokio::test]
async fn test_update_product_partial_data() {
    let app = setup().await;
    let product = app.insert_product();
    let uri = format!("{}/{}", BASE_URL, product.id.unwrap());
    let response = app
        .put_json(&uri, &json!({"name": "Partially Updated Name"}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // Nothing was merged
    let stored = app.get(&uri).await.json();
    assert_eq!(stored["name"], product.name.as_str());
}

#[tokio::test]
async fn test_update_product_wrong_content_type() {
    let app = setup().await;
    let product = app.insert_product();
    let response = app
        .request(
            Method::PUT,
            &format!("{}/{}", BASE_URL, product.id.unwrap()),
            Some("text/html"),
            Body::from("<p>nope</p>"),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// ----------------------------------------------------------
// Delete
// ----------------------------------------------------------

#[tokio::test]
async fn test_delete_product() {
    let app = setup().await;
    let products = app.create_products(5).await;
    let count = app.product_count().await;
    let uri = format!("{}/{}", BASE_URL, products[0].id.unwrap());

    let response = app.delete(&uri).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());

    let response = app.get(&uri).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.product_count().await, count - 1);
}

#[tokio::test]
async fn test_delete_product_not_found() {
    let app = setup().await;
    let response = app.delete("/products/0").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.message().contains("Product with id 0 was not found"));
}

#[tokio::test]
async fn test_delete_product_invalid_id() {
    let app = setup().await;
    let response = app.delete("/products/invalid_id").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// ----------------------------------------------------------
// List and search
// ----------------------------------------------------------

#[tokio::test]
async fn test_list_products_empty() {
    let app = setup().await;
    let response = app.get(BASE_URL).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!([]));
}

#[tokio::test]
async fn test_list_products() {
    let app = setup().await;
    app.create_products(5).await;
    assert_eq!(app.product_count().await, 5);
}

#[tokio::test]
async fn test_query_by_name() {
    let app = setup().await;
    let products = app.create_products(5).await;
    let test_name = products[0].name.clone();

    let response = app
        .get(&format!("{}?name={}", BASE_URL, test_name.replace(' ', "%20")))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = response.json();
    let found = data.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], test_name.as_str());

    let response = app.get(&format!("{}?name=NoSuchProduct", BASE_URL)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!([]));
}

#[tokio::test]
async fn test_query_by_category() {
    let app = setup().await;
    let products = app.create_products(10).await;
    let category = products[0].category;
    let expected = products.iter().filter(|p| p.category == category).count();

    let response = app
        .get(&format!("{}?category={}", BASE_URL, category))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = response.json();
    let found = data.as_array().unwrap();
    assert_eq!(found.len(), expected);
    assert!(found.iter().all(|p| p["category"] == category.as_str()));
}

#[tokio::test]
async fn test_query_by_availability() {
    let app = setup().await;
    let products = app.create_products(10).await;
    let expected = products.iter().filter(|p| p.available).count();

    let response = app.get(&format!("{}?available=true", BASE_URL)).await;
    assert_eq!(response.status, StatusCode::OK);
    let data = response.json();
    let found = data.as_array().unwrap();
    assert_eq!(found.len(), expected);
    assert!(found.iter().all(|p| p["available"] == true));
}

#[tokio::test]
async fn test_query_with_bad_filters() {
    let app = setup().await;
    let response = app.get(&format!("{}?category=SNACKS", BASE_URL)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app.get(&format!("{}?available=maybe", BASE_URL)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_query_is_a_json_error() {
    let app = setup().await;
    let response = app.get(&format!("{}?name=Hat&name=Shoes", BASE_URL)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"].as_str().unwrap().starts_with("Invalid query:"));
}

#[tokio::test]
async fn test_blank_name_lists_everything() {
    let app = setup().await;
    app.create_products(3).await;

    let response = app.get(&format!("{}?name=", BASE_URL)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json().as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_round_trip_preserves_fields() {
    let app = setup().await;
    let product = Product::new(
        "Round Trip",
        "Same on the way back",
        Decimal::from_str("0.05").unwrap(),
        false,
        Category::Housewares,
    );
    let created = app
        .post_json(BASE_URL, &serde_json::to_value(&product).unwrap())
        .await
        .json();
    let fetched = app
        .get(&format!("{}/{}", BASE_URL, created["id"]))
        .await
        .json();
    let fetched: Product = serde_json::from_value(fetched).unwrap();
    assert_eq!(fetched, product.with_id(created["id"].as_i64().unwrap()));
}

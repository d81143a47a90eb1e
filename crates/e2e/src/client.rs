//! Thin REST client for the catalog's `/products` resource

use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// Status, headers of interest and raw body of one call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub method: Method,
    pub url: String,
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl ApiResponse {
    /// Fail unless the call returned `expected`
    pub fn expect_status(self, expected: StatusCode) -> E2eResult<Self> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(E2eError::UnexpectedStatus {
                method: self.method.to_string(),
                url: self.url,
                expected: expected.as_u16(),
                actual: self.status.as_u16(),
            })
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> E2eResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[derive(Debug, Clone)]
pub struct ProductClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProductClient {
    pub fn new(base_url: &str) -> E2eResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn products_url(&self) -> String {
        format!("{}/products", self.base_url)
    }

    pub async fn list(&self) -> E2eResult<ApiResponse> {
        self.send(Method::GET, self.products_url(), &[], None).await
    }

    /// `GET /products` with query parameters such as `name` or `category`
    pub async fn search(&self, query: &[(&str, &str)]) -> E2eResult<ApiResponse> {
        self.send(Method::GET, self.products_url(), query, None).await
    }

    pub async fn get(&self, id: &str) -> E2eResult<ApiResponse> {
        let url = format!("{}/{}", self.products_url(), id);
        self.send(Method::GET, url, &[], None).await
    }

    pub async fn create(&self, payload: &Value) -> E2eResult<ApiResponse> {
        self.send(Method::POST, self.products_url(), &[], Some(payload))
            .await
    }

    pub async fn update(&self, id: &str, payload: &Value) -> E2eResult<ApiResponse> {
        let url = format!("{}/{}", self.products_url(), id);
        self.send(Method::PUT, url, &[], Some(payload)).await
    }

    pub async fn delete(&self, id: &str) -> E2eResult<ApiResponse> {
        let url = format!("{}/{}", self.products_url(), id);
        self.send(Method::DELETE, url, &[], None).await
    }

    async fn send(
        &self,
        method: Method,
        url: String,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> E2eResult<ApiResponse> {
        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        debug!("{} {} -> {}", method, url, status);
        Ok(ApiResponse {
            method,
            url,
            status,
            location,
            body,
        })
    }
}

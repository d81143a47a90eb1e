//! Per-scenario state shared by consecutive steps

use catalog_common::Product;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::browser::Browser;
use crate::client::{ApiResponse, ProductClient};
use crate::error::{E2eError, E2eResult};

/// Everything a step may read or leave behind for the next one.
///
/// A fresh context is built for every scenario; only the browser session is
/// shared across scenarios.
pub struct ScenarioContext {
    pub base_url: String,

    /// Bound for every element wait
    pub wait: Duration,

    pub client: ProductClient,

    browser: Option<Arc<dyn Browser>>,

    /// Status of the most recent REST call
    pub last_status: Option<StatusCode>,

    /// Result of the last name search
    pub searched_products: Vec<Product>,

    /// Value captured by the copy step
    pub clipboard: Option<String>,

    /// Name last typed into the Name field or searched for
    pub product_name: Option<String>,

    /// Table `id` → id assigned by the server
    pub id_aliases: HashMap<String, i64>,
}

impl ScenarioContext {
    pub fn new(
        base_url: &str,
        wait: Duration,
        browser: Option<Arc<dyn Browser>>,
    ) -> E2eResult<Self> {
        let client = ProductClient::new(base_url)?;
        Ok(Self {
            base_url: client.base_url().to_string(),
            wait,
            client,
            browser,
            last_status: None,
            searched_products: Vec::new(),
            clipboard: None,
            product_name: None,
            id_aliases: HashMap::new(),
        })
    }

    /// The browser session, or [`E2eError::NoBrowser`] for API-only runs
    pub fn browser(&self) -> E2eResult<Arc<dyn Browser>> {
        self.browser.clone().ok_or(E2eError::NoBrowser)
    }

    /// Translate an id written in a feature table to the one the server assigned
    pub fn resolve_id(&self, raw: &str) -> String {
        match self.id_aliases.get(raw) {
            Some(id) => id.to_string(),
            None => raw.to_string(),
        }
    }

    pub(crate) fn record(&mut self, response: &ApiResponse) {
        self.last_status = Some(response.status);
    }
}

//! Product entity and request payload validation
//!
//! A product is deserialized from an untyped JSON document rather than through
//! `serde` directly so that every rejection carries the exact message the
//! catalog API promises its clients (`Invalid product: missing name`,
//! `Invalid type for string [name]: number`, ...).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::{Error, Result};

/// Product category labels, serialized in upper case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Unknown,
    Cloths,
    Food,
    Housewares,
    Automotive,
    Tools,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Unknown,
        Category::Cloths,
        Category::Food,
        Category::Housewares,
        Category::Automotive,
        Category::Tools,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Cloths => "CLOTHS",
            Self::Food => "FOOD",
            Self::Housewares => "HOUSEWARES",
            Self::Automotive => "AUTOMOTIVE",
            Self::Tools => "TOOLS",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// A catalog product.
///
/// `id` is `None` until the store assigns one; it never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub available: bool,
    pub category: Category,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Decimal,
        available: bool,
        category: Category,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            price,
            available,
            category,
        }
    }

    /// Build a product from a request body.
    ///
    /// Every attribute is required; a partial document is rejected instead of
    /// being merged into an existing record. Any `id` in the body is ignored.
    pub fn deserialize_payload(body: &Value) -> Result<Self> {
        let obj = body.as_object().ok_or_else(|| {
            Error::validation("Invalid product: body of request contained bad or no data")
        })?;

        let name = required_string(obj, "name")?;
        let description = required_string(obj, "description")?;
        let price = required_price(obj)?;
        let available = required_bool(obj, "available")?;
        let category = required_category(obj)?;

        Ok(Self::new(name, description, price, available, category))
    }

    /// Copy of this product carrying the given id
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

fn required<'a>(obj: &'a Map<String, Value>, attr: &str) -> Result<&'a Value> {
    obj.get(attr)
        .ok_or_else(|| Error::validation(format!("Invalid product: missing {}", attr)))
}

fn required_string(obj: &Map<String, Value>, attr: &str) -> Result<String> {
    match required(obj, attr)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(Error::validation(format!(
            "Invalid type for string [{}]: {}",
            attr,
            json_type(other)
        ))),
    }
}

fn required_bool(obj: &Map<String, Value>, attr: &str) -> Result<bool> {
    match required(obj, attr)? {
        Value::Bool(b) => Ok(*b),
        other => Err(Error::validation(format!(
            "Invalid type for boolean [{}]: {}",
            attr,
            json_type(other)
        ))),
    }
}

fn required_price(obj: &Map<String, Value>) -> Result<Decimal> {
    let raw = match required(obj, "price")? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(Error::validation(format!(
                "Invalid attribute: price must be a decimal, got {}",
                json_type(other)
            )))
        }
    };
    Decimal::from_str(&raw)
        .map_err(|e| Error::validation(format!("Invalid attribute: price '{}': {}", raw, e)))
}

fn required_category(obj: &Map<String, Value>) -> Result<Category> {
    match required(obj, "category")? {
        Value::String(s) => s
            .parse()
            .map_err(|e| Error::validation(format!("Invalid attribute: {}", e))),
        other => Err(Error::validation(format!(
            "Invalid type for string [category]: {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

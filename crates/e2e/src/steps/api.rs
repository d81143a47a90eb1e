//! Steps that load and check catalog data through the REST API

use catalog_common::{Category, Product};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::{debug, info};

use crate::client::ApiResponse;
use crate::context::ScenarioContext;
use crate::error::{E2eError, E2eResult};
use crate::feature::{DataTable, TableRow};

fn checked(
    ctx: &mut ScenarioContext,
    response: ApiResponse,
    expected: StatusCode,
) -> E2eResult<ApiResponse> {
    ctx.record(&response);
    response.expect_status(expected)
}

fn invalid(what: &str, raw: &str, reason: impl std::fmt::Display) -> E2eError {
    E2eError::StepFailed {
        step: what.to_string(),
        reason: format!("'{}': {}", raw, reason),
    }
}

fn parse_price(raw: &str) -> E2eResult<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| invalid("price", raw, e))
}

/// Table booleans are written `True`/`False`
fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

fn product_from_row(row: &TableRow<'_>) -> E2eResult<Product> {
    let category = row.require("category")?;
    Ok(Product::new(
        row.require("name")?,
        row.require("description")?,
        parse_price(row.require("price")?)?,
        parse_flag(row.require("available")?),
        Category::from_str(category.trim()).map_err(|e| invalid("category", category, e))?,
    ))
}

fn payload(product: &Product) -> Value {
    json!({
        "name": product.name,
        "description": product.description,
        "price": product.price.to_string(),
        "available": product.available,
        "category": product.category,
    })
}

/// Delete every product the service lists
pub async fn empty_catalog(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let response = ctx.client.list().await?;
    let products: Vec<Product> = checked(ctx, response, StatusCode::OK)?.json()?;

    for id in products.iter().filter_map(|p| p.id) {
        let response = ctx.client.delete(&id.to_string()).await?;
        checked(ctx, response, StatusCode::NO_CONTENT)?;
    }

    ctx.id_aliases.clear();
    debug!("Removed {} product(s)", products.len());
    Ok(())
}

/// Empty the catalog, then create one product per table row
pub async fn load_products(ctx: &mut ScenarioContext, table: &DataTable) -> E2eResult<()> {
    empty_catalog(ctx).await?;

    for row in table.rows() {
        let product = product_from_row(&row)?;
        let response = ctx.client.create(&payload(&product)).await?;
        let created: Product = checked(ctx, response, StatusCode::CREATED)?.json()?;
        let id = created
            .id
            .ok_or_else(|| E2eError::assertion(format!("created '{}' without an id", product.name)))?;

        if let Some(table_id) = row.get("id") {
            ctx.id_aliases.insert(table_id.to_string(), id);
        }
    }

    info!("Loaded {} product(s)", table.rows.len());
    Ok(())
}

/// Every row must be listed by the service with equal fields
pub async fn products_should_exist(ctx: &mut ScenarioContext, table: &DataTable) -> E2eResult<()> {
    let response = ctx.client.list().await?;
    let listed: Vec<Product> = checked(ctx, response, StatusCode::OK)?.json()?;
    // Without an id column rows are matched by name
    let by_id = table.has_column("id");

    for row in table.rows() {
        let mut expected = product_from_row(&row)?;

        let found = if by_id {
            let resolved = ctx.resolve_id(row.require("id")?);
            let id: i64 = resolved.parse().map_err(|e| invalid("id", &resolved, e))?;
            listed.iter().find(|p| p.id == Some(id))
        } else {
            listed.iter().find(|p| p.name == expected.name)
        }
        .ok_or_else(|| E2eError::assertion(format!("product '{}' is not in the catalog", expected.name)))?;

        expected.id = found.id;
        if &expected != found {
            return Err(E2eError::assertion(format!(
                "expected {:?}, found {:?}",
                expected, found
            )));
        }
    }
    Ok(())
}

/// Read the product, change its price and write it back
pub async fn update_price(ctx: &mut ScenarioContext, product_id: &str, price: &str) -> E2eResult<()> {
    let id = ctx.resolve_id(product_id);
    let price = parse_price(price)?;

    let response = ctx.client.get(&id).await?;
    let mut body: Value = checked(ctx, response, StatusCode::OK)?.json()?;
    body.as_object_mut()
        .ok_or_else(|| E2eError::assertion(format!("product {} is not a JSON object", id)))?
        .insert("price".to_string(), Value::String(price.to_string()));

    let response = ctx.client.update(&id, &body).await?;
    let updated: Product = checked(ctx, response, StatusCode::OK)?.json()?;
    if updated.price != price {
        return Err(E2eError::assertion(format!(
            "price of product {} is {}, expected {}",
            id, updated.price, price
        )));
    }
    Ok(())
}

pub async fn delete_product(ctx: &mut ScenarioContext, product_id: &str) -> E2eResult<()> {
    let id = ctx.resolve_id(product_id);
    let response = ctx.client.delete(&id).await?;
    checked(ctx, response, StatusCode::NO_CONTENT)?;
    Ok(())
}

pub async fn product_should_not_exist(ctx: &mut ScenarioContext, product_id: &str) -> E2eResult<()> {
    let id = ctx.resolve_id(product_id);
    let response = ctx.client.get(&id).await?;
    checked(ctx, response, StatusCode::NOT_FOUND)?;
    Ok(())
}

/// Query by exact name and keep the result for the following steps
pub async fn search_by_name(ctx: &mut ScenarioContext, name: &str) -> E2eResult<()> {
    let response = ctx.client.search(&[("name", name)]).await?;
    ctx.searched_products = checked(ctx, response, StatusCode::OK)?.json()?;
    debug!("Search for '{}' found {}", name, ctx.searched_products.len());
    Ok(())
}

pub fn should_find_name(ctx: &ScenarioContext, name: &str, present: bool) -> E2eResult<()> {
    let found = ctx.searched_products.iter().any(|p| p.name == name);
    match (found, present) {
        (true, false) => Err(E2eError::assertion(format!(
            "search results unexpectedly contain '{}'",
            name
        ))),
        (false, true) => Err(E2eError::assertion(format!(
            "search results do not contain '{}'",
            name
        ))),
        _ => Ok(()),
    }
}

//! Steps that drive the admin page through the browser

use tracing::info;

use crate::browser::{wait_for_text, wait_for_value};
use crate::context::ScenarioContext;
use crate::elements::{button_id, element_id, MESSAGE_ID, RESULTS_ID, SEARCH_BUTTON_ID};
use crate::error::{E2eError, E2eResult};
use crate::feature::DataTable;

pub async fn visit_home_page(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let browser = ctx.browser()?;
    browser.goto(&ctx.base_url).await
}

pub async fn title_contains(ctx: &mut ScenarioContext, message: &str) -> E2eResult<()> {
    let title = ctx.browser()?.title().await?;
    if title.contains(message) {
        Ok(())
    } else {
        Err(E2eError::assertion(format!(
            "title '{}' does not contain '{}'",
            title, message
        )))
    }
}

pub async fn page_lacks(ctx: &mut ScenarioContext, text: &str) -> E2eResult<()> {
    let body = ctx.browser()?.body_text().await?;
    if body.contains(text) {
        Err(E2eError::assertion(format!("page unexpectedly shows '{}'", text)))
    } else {
        Ok(())
    }
}

pub async fn set_field(ctx: &mut ScenarioContext, element_name: &str, text: &str) -> E2eResult<()> {
    let id = element_id(element_name);
    ctx.browser()?.set_value(&id, text).await?;
    if id == element_id("Name") {
        ctx.product_name = Some(text.to_string());
    }
    Ok(())
}

/// Like [`set_field`], after waiting for the field to be shown
pub async fn change_field(ctx: &mut ScenarioContext, element_name: &str, text: &str) -> E2eResult<()> {
    let id = element_id(element_name);
    ctx.browser()?.wait_for_element(&id, ctx.wait).await?;
    set_field(ctx, element_name, text).await
}

pub async fn select_option(ctx: &mut ScenarioContext, element_name: &str, option: &str) -> E2eResult<()> {
    ctx.browser()?
        .select_by_text(&element_id(element_name), option)
        .await
}

pub async fn dropdown_shows(ctx: &mut ScenarioContext, element_name: &str, text: &str) -> E2eResult<()> {
    let selected = ctx
        .browser()?
        .selected_text(&element_id(element_name))
        .await?;
    if selected == text {
        Ok(())
    } else {
        Err(E2eError::assertion(format!(
            "'{}' dropdown shows '{}', expected '{}'",
            element_name, selected, text
        )))
    }
}

pub async fn field_empty(ctx: &mut ScenarioContext, element_name: &str) -> E2eResult<()> {
    let value = ctx
        .browser()?
        .element_value(&element_id(element_name))
        .await?;
    if value.is_empty() {
        Ok(())
    } else {
        Err(E2eError::assertion(format!(
            "'{}' field holds '{}', expected it to be empty",
            element_name, value
        )))
    }
}

pub async fn copy_field(ctx: &mut ScenarioContext, element_name: &str) -> E2eResult<()> {
    let id = element_id(element_name);
    let browser = ctx.browser()?;
    browser.wait_for_element(&id, ctx.wait).await?;
    let value = browser.element_value(&id).await?;
    info!("Clipboard contains: {}", value);
    ctx.clipboard = Some(value);
    Ok(())
}

pub async fn paste_field(ctx: &mut ScenarioContext, element_name: &str) -> E2eResult<()> {
    let id = element_id(element_name);
    let value = ctx.clipboard.clone().ok_or_else(|| E2eError::StepFailed {
        step: format!("paste into '{}'", element_name),
        reason: "nothing has been copied".to_string(),
    })?;
    let browser = ctx.browser()?;
    browser.wait_for_element(&id, ctx.wait).await?;
    browser.set_value(&id, &value).await
}

pub async fn press_button(ctx: &mut ScenarioContext, button: &str) -> E2eResult<()> {
    ctx.browser()?.click(&button_id(button)).await
}

pub async fn field_contains(ctx: &mut ScenarioContext, element_name: &str, text: &str) -> E2eResult<()> {
    let browser = ctx.browser()?;
    wait_for_value(browser.as_ref(), &element_id(element_name), text, ctx.wait).await
}

pub async fn message_shown(ctx: &mut ScenarioContext, message: &str) -> E2eResult<()> {
    let browser = ctx.browser()?;
    wait_for_text(browser.as_ref(), MESSAGE_ID, message, ctx.wait).await
}

pub async fn results_contain(ctx: &mut ScenarioContext, text: &str) -> E2eResult<()> {
    let browser = ctx.browser()?;
    wait_for_text(browser.as_ref(), RESULTS_ID, text, ctx.wait).await
}

pub async fn results_lack(ctx: &mut ScenarioContext, text: &str) -> E2eResult<()> {
    let results = ctx.browser()?.element_text(RESULTS_ID).await?;
    if results.contains(text) {
        Err(E2eError::assertion(format!("results unexpectedly contain '{}'", text)))
    } else {
        Ok(())
    }
}

pub async fn results_contain_table(ctx: &mut ScenarioContext, table: &DataTable) -> E2eResult<()> {
    for row in table.rows() {
        results_contain(ctx, row.require("name")?).await?;
    }
    Ok(())
}

/// Type the name into the Name field and press Search
pub async fn search_for(ctx: &mut ScenarioContext, name: &str) -> E2eResult<()> {
    let browser = ctx.browser()?;
    browser.set_value(&element_id("Name"), name).await?;
    browser.click(SEARCH_BUTTON_ID).await?;
    ctx.product_name = Some(name.to_string());
    Ok(())
}

/// The name last searched for or typed must not be listed
pub async fn product_not_in_results(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let name = ctx.product_name.clone().ok_or_else(|| E2eError::StepFailed {
        step: "check results".to_string(),
        reason: "no product name has been entered".to_string(),
    })?;
    results_lack(ctx, &name).await
}

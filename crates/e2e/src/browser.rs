//! Browser automation over WebDriver
//!
//! Web steps talk to a [`Browser`] rather than to `thirtyfour` directly, so the
//! step layer can be exercised against an in-memory page in tests. Every wait is
//! an explicit poll bounded by the scenario's wait budget.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use thirtyfour::prelude::*;
use thirtyfour::{Capabilities, ChromiumLikeCapabilities};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::{DriverKind, HarnessConfig};
use crate::error::{E2eError, E2eResult};

/// Delay between two probes of a polling wait
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The browser operations web steps are built from.
///
/// Elements are addressed by id only; the admin page's id convention lives in
/// [`crate::elements`].
#[async_trait]
pub trait Browser: Send + Sync {
    async fn goto(&self, url: &str) -> E2eResult<()>;

    async fn title(&self) -> E2eResult<String>;

    /// Visible text of the whole page
    async fn body_text(&self) -> E2eResult<String>;

    /// Visible text of one element
    async fn element_text(&self, id: &str) -> E2eResult<String>;

    /// Current `value` of an input; empty when unset
    async fn element_value(&self, id: &str) -> E2eResult<String>;

    /// Clear an input, then type `text` into it
    async fn set_value(&self, id: &str, text: &str) -> E2eResult<()>;

    async fn click(&self, id: &str) -> E2eResult<()>;

    /// Choose the option of a `<select>` whose visible text is `text`
    async fn select_by_text(&self, id: &str, text: &str) -> E2eResult<()>;

    /// Visible text of the first selected option of a `<select>`
    async fn selected_text(&self, id: &str) -> E2eResult<String>;

    /// Resolve once the element is present and displayed
    async fn wait_for_element(&self, id: &str, timeout: Duration) -> E2eResult<()>;

    async fn quit(&self) -> E2eResult<()>;
}

#[derive(Debug, Clone, Copy)]
enum Probe {
    Text,
    Value,
}

/// Poll an input until its value contains `needle`
pub async fn wait_for_value(
    browser: &dyn Browser,
    id: &str,
    needle: &str,
    timeout: Duration,
) -> E2eResult<()> {
    poll_contains(browser, Probe::Value, id, needle, timeout).await
}

/// Poll an element until its text contains `needle`
pub async fn wait_for_text(
    browser: &dyn Browser,
    id: &str,
    needle: &str,
    timeout: Duration,
) -> E2eResult<()> {
    poll_contains(browser, Probe::Text, id, needle, timeout).await
}

async fn poll_contains(
    browser: &dyn Browser,
    probe: Probe,
    id: &str,
    needle: &str,
    timeout: Duration,
) -> E2eResult<()> {
    let start = Instant::now();
    let mut last_seen = String::new();

    loop {
        let current = match probe {
            Probe::Text => browser.element_text(id).await,
            Probe::Value => browser.element_value(id).await,
        };

        match current {
            Ok(seen) if seen.contains(needle) => return Ok(()),
            Ok(seen) => last_seen = seen,
            // The element may not be rendered yet
            Err(e) => debug!("Probe of #{} failed: {}", id, e),
        }

        if start.elapsed() >= timeout {
            return Err(E2eError::Timeout(format!(
                "'{}' in #{} after {:?} (last seen: '{}')",
                needle, id, timeout, last_seen
            )));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Screen size headless sessions render the page at
pub const WINDOW_SIZE_ARG: &str = "--window-size=1920,1080";

/// Headless capabilities for a driver kind
pub fn capabilities(kind: DriverKind) -> E2eResult<Capabilities> {
    Ok(match kind {
        DriverKind::Chrome => {
            let mut caps = DesiredCapabilities::chrome();
            caps.set_headless()?;
            caps.set_no_sandbox()?;
            caps.set_disable_dev_shm_usage()?;
            caps.set_disable_gpu()?;
            caps.add_arg(WINDOW_SIZE_ARG)?;
            caps.into()
        }
        DriverKind::Firefox => {
            let mut caps = DesiredCapabilities::firefox();
            caps.set_headless()?;
            caps.add_arg(WINDOW_SIZE_ARG)?;
            caps.into()
        }
    })
}

/// A headless browser session driven through a WebDriver endpoint
pub struct WebDriverBrowser {
    driver: WebDriver,
    kind: DriverKind,
}

impl WebDriverBrowser {
    /// Open a headless session for the configured driver
    pub async fn launch(config: &HarnessConfig) -> E2eResult<Self> {
        info!(
            "Setting up {} driver via {}",
            config.driver, config.webdriver_url
        );

        let unavailable = |e: thirtyfour::error::WebDriverError| E2eError::DriverUnavailable {
            url: config.webdriver_url.clone(),
            reason: e.to_string(),
        };

        let driver = WebDriver::new(config.webdriver_url.as_str(), capabilities(config.driver)?)
            .await
            .map_err(unavailable)?;

        Ok(Self {
            driver,
            kind: config.driver,
        })
    }

    async fn element(&self, id: &str) -> E2eResult<WebElement> {
        Ok(self.driver.find(By::Id(id)).await?)
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn title(&self) -> E2eResult<String> {
        Ok(self.driver.title().await?)
    }

    async fn body_text(&self) -> E2eResult<String> {
        let body = self.driver.find(By::Tag("body")).await?;
        Ok(body.text().await?)
    }

    async fn element_text(&self, id: &str) -> E2eResult<String> {
        Ok(self.element(id).await?.text().await?)
    }

    async fn element_value(&self, id: &str) -> E2eResult<String> {
        Ok(self.element(id).await?.value().await?.unwrap_or_default())
    }

    async fn set_value(&self, id: &str, text: &str) -> E2eResult<()> {
        let elem = self.element(id).await?;
        elem.clear().await?;
        elem.send_keys(text).await?;
        Ok(())
    }

    async fn click(&self, id: &str) -> E2eResult<()> {
        self.element(id).await?.click().await?;
        Ok(())
    }

    async fn select_by_text(&self, id: &str, text: &str) -> E2eResult<()> {
        let select = self.element(id).await?;
        for option in select.find_all(By::Tag("option")).await? {
            if option.text().await?.trim() == text {
                option.click().await?;
                return Ok(());
            }
        }
        Err(E2eError::assertion(format!(
            "dropdown #{} has no option '{}'",
            id, text
        )))
    }

    async fn selected_text(&self, id: &str) -> E2eResult<String> {
        let selector = format!("#{} option:checked", id);
        let option = self.driver.find(By::Css(selector.as_str())).await?;
        Ok(option.text().await?.trim().to_string())
    }

    async fn wait_for_element(&self, id: &str, timeout: Duration) -> E2eResult<()> {
        self.driver
            .query(By::Id(id))
            .wait(timeout, POLL_INTERVAL)
            .and_displayed()
            .first()
            .await
            .map_err(|e| E2eError::Timeout(format!("element #{}: {}", id, e)))?;
        Ok(())
    }

    async fn quit(&self) -> E2eResult<()> {
        info!("Closing {} session", self.kind);
        self.driver.clone().quit().await?;
        Ok(())
    }
}

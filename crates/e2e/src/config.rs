//! Harness configuration read from the environment

use std::fmt;
use std::time::Duration;

use crate::error::{E2eError, E2eResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_WAIT_SECONDS: u64 = 30;
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Browser the WebDriver session is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverKind {
    #[default]
    Firefox,
    Chrome,
}

impl DriverKind {
    /// Anything mentioning firefox selects Firefox, everything else Chrome
    pub fn from_name(name: &str) -> Self {
        if name.to_ascii_lowercase().contains("firefox") {
            Self::Firefox
        } else {
            Self::Chrome
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Firefox => "firefox",
            Self::Chrome => "chrome",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Root URL of the catalog under test
    pub base_url: String,

    /// Boot the reference service in-process instead of using `base_url`
    pub boot_service: bool,

    /// Upper bound for every element wait
    pub wait_seconds: u64,

    pub driver: DriverKind,

    /// WebDriver endpoint (geckodriver, chromedriver or a Selenium hub)
    pub webdriver_url: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            boot_service: true,
            wait_seconds: DEFAULT_WAIT_SECONDS,
            driver: DriverKind::default(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Read `BASE_URL`, `WAIT_SECONDS`, `DRIVER` and `WEBDRIVER_URL`
    pub fn from_env() -> E2eResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(url) = lookup("BASE_URL").filter(|u| !u.trim().is_empty()) {
            cfg.base_url = url.trim().trim_end_matches('/').to_string();
            cfg.boot_service = false;
        }

        if let Some(raw) = lookup("WAIT_SECONDS") {
            cfg.wait_seconds = raw.trim().parse().map_err(|_| {
                E2eError::InvalidConfig(format!("WAIT_SECONDS must be a whole number, got '{}'", raw))
            })?;
        }

        if let Some(name) = lookup("DRIVER") {
            cfg.driver = DriverKind::from_name(&name);
        }

        if let Some(url) = lookup("WEBDRIVER_URL") {
            cfg.webdriver_url = url;
        }

        Ok(cfg)
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }
}

//! Error types for acceptance runs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Server health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("WebDriver not reachable at {url}: {reason}")]
    DriverUnavailable { url: String, reason: String },

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error("No browser session is available for web steps")]
    NoBrowser,

    #[error("Feature parse error in {file} at line {line}: {reason}")]
    FeatureParse {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Undefined step: {0}")]
    UndefinedStep(String),

    #[error("Ambiguous step '{text}' matches {patterns:?}")]
    AmbiguousStep { text: String, patterns: Vec<String> },

    #[error("Duplicate step definition: {0}")]
    DuplicateStep(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("{method} {url} returned {actual}, expected {expected}")]
    UnexpectedStatus {
        method: String,
        url: String,
        expected: u16,
        actual: u16,
    },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid step pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

impl E2eError {
    pub(crate) fn assertion(msg: impl Into<String>) -> Self {
        Self::AssertionFailed(msg.into())
    }
}

//! Scenario runner that orchestrates the catalog service, the browser and the steps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::browser::{Browser, WebDriverBrowser};
use crate::config::HarnessConfig;
use crate::context::ScenarioContext;
use crate::error::{E2eError, E2eResult};
use crate::feature::{Feature, Scenario};
use crate::server::{wait_for_healthy, ServerConfig, ServerHandle};
use crate::steps::{self, StepRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
}

/// Result of executing one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub keyword: String,
    pub text: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub feature: String,
    pub name: String,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

impl TestResult {
    pub fn success(&self) -> bool {
        self.status != ScenarioStatus::Failed
    }
}

/// Result of running all selected scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub results: Vec<TestResult>,
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub harness: HarnessConfig,
    pub server: ServerConfig,
    pub features_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Run only scenarios carrying one of these tags
    pub tags: Vec<String>,
    /// Run only scenarios whose feature or scenario name contains this text
    pub filter: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            harness: HarnessConfig::default(),
            server: ServerConfig::default(),
            features_dir: PathBuf::from("features"),
            output_dir: PathBuf::from("test-results"),
            tags: Vec::new(),
            filter: None,
        }
    }
}

impl RunnerConfig {
    pub fn from_env() -> E2eResult<Self> {
        Ok(Self {
            harness: HarnessConfig::from_env()?,
            server: ServerConfig::from_env(),
            ..Default::default()
        })
    }
}

/// Acceptance scenario runner
pub struct TestRunner {
    config: RunnerConfig,

    /// Every step sentence the features may use
    registry: StepRegistry,

    /// Reference service, when booted by the runner
    server: Option<ServerHandle>,

    /// Browser session shared by all web scenarios
    browser: Option<Arc<dyn Browser>>,

    /// Whether a browser launch was already attempted
    browser_checked: bool,

    base_url: String,
}

impl TestRunner {
    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> E2eResult<Self> {
        Ok(Self {
            registry: StepRegistry::catalog()?,
            server: None,
            browser: None,
            browser_checked: false,
            base_url: config.harness.base_url.clone(),
            config,
        })
    }

    /// Use an existing browser instead of opening a WebDriver session
    pub fn with_browser(mut self, browser: Arc<dyn Browser>) -> Self {
        self.browser = Some(browser);
        self.browser_checked = true;
        self
    }

    /// URL the scenarios run against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Boot the reference service, or check the external target is up
    pub async fn start_server(&mut self) -> E2eResult<()> {
        if self.server.is_some() {
            return Ok(()); // Already running
        }

        if self.config.harness.boot_service {
            let server = ServerHandle::spawn(self.config.server.clone()).await?;
            self.base_url = server.base_url().to_string();
            self.server = Some(server);
        } else {
            wait_for_healthy(&self.base_url, self.config.server.startup_timeout).await?;
            info!("Using catalog at {}", self.base_url);
        }
        Ok(())
    }

    /// Open the shared browser session once; `false` when none is available
    pub async fn ensure_browser(&mut self) -> bool {
        if !self.browser_checked {
            self.browser_checked = true;
            match WebDriverBrowser::launch(&self.config.harness).await {
                Ok(browser) => self.browser = Some(Arc::new(browser)),
                Err(e) => warn!("Browser scenarios will be skipped: {}", e),
            }
        }
        self.browser.is_some()
    }

    /// Stop the service and close the browser session
    pub async fn shutdown(&mut self) -> E2eResult<()> {
        if let Some(browser) = self.browser.take() {
            if let Err(e) = browser.quit().await {
                warn!("Failed to close browser: {}", e);
            }
        }
        if let Some(mut server) = self.server.take() {
            server.stop().await?;
        }
        Ok(())
    }

    /// Run every feature under the features directory
    pub async fn run_all(&mut self) -> E2eResult<TestSuiteResult> {
        let features = Feature::load_all(&self.config.features_dir)?;
        if features.is_empty() {
            warn!("No features found in {}", self.config.features_dir.display());
        }
        self.run_features(&features).await
    }

    fn is_selected(&self, feature: &Feature, scenario: &Scenario) -> bool {
        let tagged = self.config.tags.is_empty()
            || self.config.tags.iter().any(|t| scenario.has_tag(t));

        let named = match &self.config.filter {
            Some(filter) => {
                let filter = filter.to_lowercase();
                scenario.name.to_lowercase().contains(&filter)
                    || feature.name.to_lowercase().contains(&filter)
            }
            None => true,
        };

        tagged && named
    }

    fn needs_browser(&self, feature: &Feature, scenario: &Scenario) -> bool {
        feature
            .background
            .iter()
            .chain(&scenario.steps)
            .filter_map(|step| self.registry.resolve(&step.text).ok())
            .any(|m| m.kind.needs_browser())
    }

    /// Run the selected scenarios of `features`, one at a time
    pub async fn run_features(&mut self, features: &[Feature]) -> E2eResult<TestSuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();

        let selected: Vec<(&Feature, &Scenario)> = features
            .iter()
            .flat_map(|f| f.scenarios.iter().map(move |s| (f, s)))
            .filter(|(f, s)| self.is_selected(f, s))
            .collect();

        // Ensure server is running
        self.start_server().await?;

        if selected.iter().any(|(f, s)| self.needs_browser(f, s)) {
            self.ensure_browser().await;
        }

        info!("Running {} scenario(s)...", selected.len());

        let mut results = Vec::new();
        for (feature, scenario) in selected {
            let result = if self.needs_browser(feature, scenario) && self.browser.is_none() {
                info!("- {} (skipped: no browser)", scenario.name);
                TestResult {
                    feature: feature.name.clone(),
                    name: scenario.name.clone(),
                    status: ScenarioStatus::Skipped,
                    duration_ms: 0,
                    steps: vec![],
                    error: Some("no WebDriver session available".to_string()),
                }
            } else {
                self.run_scenario(feature, scenario).await
            };

            match result.status {
                ScenarioStatus::Passed => info!("✓ {} ({} ms)", result.name, result.duration_ms),
                ScenarioStatus::Failed => error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                ),
                ScenarioStatus::Skipped => {}
            }
            results.push(result);
        }

        let count = |status| results.iter().filter(|r| r.status == status).count();
        let passed = count(ScenarioStatus::Passed);
        let failed = count(ScenarioStatus::Failed);
        let skipped = count(ScenarioStatus::Skipped);
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        Ok(TestSuiteResult {
            total: results.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            started_at,
            results,
        })
    }

    /// Run the background and steps of one scenario, stopping at the first failure
    pub async fn run_scenario(&self, feature: &Feature, scenario: &Scenario) -> TestResult {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        let mut step_results = Vec::new();
        let mut scenario_error: Option<String> = None;

        match ScenarioContext::new(&self.base_url, self.config.harness.wait(), self.browser.clone()) {
            Ok(mut ctx) => {
                for step in feature.background.iter().chain(&scenario.steps) {
                    let step_start = Instant::now();
                    let outcome = match self.registry.resolve(&step.text) {
                        Ok(matched) => steps::execute(&mut ctx, &matched, step.table.as_ref()).await,
                        Err(e) => Err(e),
                    };

                    let error = outcome.err().map(|e| step_error(step.line, e));
                    step_results.push(StepResult {
                        keyword: step.keyword.to_string(),
                        text: step.text.clone(),
                        success: error.is_none(),
                        duration_ms: step_start.elapsed().as_millis() as u64,
                        error: error.clone(),
                    });

                    if error.is_some() {
                        scenario_error = error;
                        break; // Stop on first failure
                    }
                    debug!("  {} {}", step.keyword, step.text);
                }
            }
            Err(e) => scenario_error = Some(e.to_string()),
        }

        TestResult {
            feature: feature.name.clone(),
            name: scenario.name.clone(),
            status: if scenario_error.is_none() {
                ScenarioStatus::Passed
            } else {
                ScenarioStatus::Failed
            },
            duration_ms: start.elapsed().as_millis() as u64,
            steps: step_results,
            error: scenario_error,
        }
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("acceptance-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn step_error(line: usize, error: E2eError) -> String {
    format!("line {}: {}", line, error)
}

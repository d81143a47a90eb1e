//! Product Catalog Acceptance Harness
//!
//! This crate runs Gherkin scenarios against a product catalog service:
//! - Boots the reference catalog service in-process, or targets `BASE_URL`
//! - Drives a headless browser through WebDriver for `@web` scenarios
//! - Resolves every step sentence to exactly one step definition
//! - Writes a JSON summary of the run
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Scenario Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── start_server() -> ServerHandle | external BASE_URL   │
//! │    ├── ensure_browser() -> Arc<dyn Browser>                 │
//! │    ├── run_scenario(feature, scenario) -> TestResult        │
//! │    └── write_results(suite) -> acceptance-results.json      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Feature (Gherkin)                                          │
//! │    ├── Background: [Step]                                   │
//! │    └── Scenario: tags, [Step { keyword, text, table }]      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  StepRegistry                                               │
//! │    ├── resolve(text) -> StepMatch { kind, args }            │
//! │    └── execute(&mut ScenarioContext, match, table)          │
//! │          ├── api: ProductClient (REST)                      │
//! │          └── web: Browser (WebDriver)                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod client;
pub mod config;
pub mod context;
pub mod elements;
pub mod error;
pub mod feature;
pub mod runner;
pub mod server;
pub mod steps;

pub use browser::{Browser, WebDriverBrowser};
pub use client::{ApiResponse, ProductClient};
pub use config::{DriverKind, HarnessConfig};
pub use context::ScenarioContext;
pub use elements::{button_id, element_id};
pub use error::{E2eError, E2eResult};
pub use feature::{DataTable, Feature, Scenario, Step};
pub use runner::{RunnerConfig, TestRunner, TestSuiteResult};
pub use steps::{StepKind, StepMatch, StepRegistry};

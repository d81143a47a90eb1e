//! REST steps and the runner against an in-process catalog service

use std::path::Path;
use std::time::Duration;

use catalog_common::Product;
use catalog_e2e::runner::ScenarioStatus;
use catalog_e2e::server::{ServerConfig, ServerHandle};
use catalog_e2e::steps;
use catalog_e2e::{
    E2eError, E2eResult, Feature, HarnessConfig, RunnerConfig, ScenarioContext, StepRegistry,
    TestRunner, TestSuiteResult,
};
use reqwest::StatusCode;

const PRODUCTS: &str = r#"
Feature: Inline catalog
Scenario: Load
    Given the following products
        | id | name   | description | price | available | category |
        | 1  | Widget | d           | 19.99 | True      | FOOD     |
        | 2  | Gadget | e           | 5.00  | False     | TOOLS    |
"#;

async fn run_source(source: &str, harness: HarnessConfig) -> TestSuiteResult {
    let feature = Feature::parse(source, "inline.feature").unwrap();
    let mut runner = TestRunner::with_config(RunnerConfig {
        harness,
        ..Default::default()
    })
    .unwrap();
    let results = runner.run_features(&[feature]).await.unwrap();
    runner.shutdown().await.unwrap();
    results
}

/// Resolve and run each sentence, offering the inline product table to every step
async fn run_steps(ctx: &mut ScenarioContext, sentences: &[&str]) -> E2eResult<()> {
    let registry = StepRegistry::catalog()?;
    let table = Feature::parse(PRODUCTS, "inline.feature")?.scenarios[0].steps[0]
        .table
        .clone();

    for sentence in sentences {
        let matched = registry.resolve(sentence)?;
        steps::execute(ctx, &matched, table.as_ref()).await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_products_feature_passes() {
    let feature = Feature::from_file(&Path::new(env!("CARGO_MANIFEST_DIR")).join("features/products.feature")).unwrap();
    let scenarios = feature.scenarios.len();

    let mut runner = TestRunner::with_config(RunnerConfig::default()).unwrap();
    let results = runner.run_features(&[feature]).await.unwrap();
    runner.shutdown().await.unwrap();

    for result in &results.results {
        assert!(result.success(), "{}: {:?}", result.name, result.error);
    }
    assert_eq!(results.total, scenarios);
    assert_eq!(results.passed, scenarios);
    assert_eq!(results.failed, 0);
}

#[tokio::test]
async fn test_failing_step_stops_scenario() {
    let source = format!(
        "{}    Then the product with id \"1\" should not exist\n    When I delete the product with id \"1\"\n",
        PRODUCTS
    );
    let results = run_source(&source, HarnessConfig::default()).await;

    assert_eq!(results.failed, 1);
    let result = &results.results[0];
    assert_eq!(result.status, ScenarioStatus::Failed);
    assert_eq!(result.steps.len(), 2);
    assert!(result.steps[0].success);
    assert!(!result.steps[1].success);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .contains("returned 200, expected 404"));
}

#[tokio::test]
async fn test_undefined_step_fails_scenario() {
    let results = run_source(
        "Feature: f\nScenario: s\n    When I juggle three products\n",
        HarnessConfig::default(),
    )
    .await;

    assert_eq!(results.failed, 1);
    assert!(results.results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("Undefined step"));
}

#[tokio::test]
async fn test_web_scenarios_skipped_without_webdriver() {
    let source = format!(
        "{}\n@web\nScenario: Page\n    When I visit the \"Home Page\"\n",
        PRODUCTS
    );
    let harness = HarnessConfig {
        webdriver_url: "http://127.0.0.1:1".to_string(),
        ..Default::default()
    };
    let results = run_source(&source, harness).await;

    assert_eq!(results.total, 2);
    assert_eq!(results.passed, 1);
    assert_eq!(results.skipped, 1);
    assert_eq!(results.failed, 0);
    assert_eq!(results.results[1].status, ScenarioStatus::Skipped);
}

#[tokio::test]
async fn test_update_price_through_table_ids() {
    let mut server = ServerHandle::spawn(ServerConfig::default()).await.unwrap();
    let mut ctx = ScenarioContext::new(server.base_url(), Duration::from_secs(1), None).unwrap();

    // Ids 1 and 2 are taken, so the reload below gets fresh server ids
    run_steps(&mut ctx, &["the following products", "the following products"])
        .await
        .unwrap();
    let widget_id = ctx.id_aliases["1"];
    assert_ne!(widget_id, 1);

    run_steps(&mut ctx, &[r#"I update the product with id "1" to have price "29.99""#])
        .await
        .unwrap();
    assert_eq!(ctx.last_status, Some(StatusCode::OK));

    let product: Product = ctx
        .client
        .get(&widget_id.to_string())
        .await
        .unwrap()
        .expect_status(StatusCode::OK)
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(product.price.to_string(), "29.99");
    assert_eq!(product.name, "Widget");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_delete_and_search_steps() {
    let mut server = ServerHandle::spawn(ServerConfig::default()).await.unwrap();
    let mut ctx = ScenarioContext::new(server.base_url(), Duration::from_secs(1), None).unwrap();

    run_steps(
        &mut ctx,
        &[
            "the following products",
            r#"I search for a product with name "Gadget""#,
            r#"I should find the product with name "Gadget""#,
            r#"I should not find the product with name "Widget""#,
            r#"I delete the product with id "2""#,
            r#"the product with id "2" should not exist"#,
        ],
    )
    .await
    .unwrap();
    assert_eq!(ctx.last_status, Some(StatusCode::NOT_FOUND));

    // Deleting twice reports the 404
    let err = run_steps(&mut ctx, &[r#"I delete the product with id "2""#])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        E2eError::UnexpectedStatus {
            expected: 204,
            actual: 404,
            ..
        }
    ));

    run_steps(&mut ctx, &["the product database is empty"]).await.unwrap();
    let listed: Vec<Product> = ctx.client.list().await.unwrap().json().unwrap();
    assert!(listed.is_empty());
    assert!(ctx.id_aliases.is_empty());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_should_exist_detects_mismatch() {
    let mut server = ServerHandle::spawn(ServerConfig::default()).await.unwrap();
    let mut ctx = ScenarioContext::new(server.base_url(), Duration::from_secs(1), None).unwrap();

    run_steps(&mut ctx, &["the following products"]).await.unwrap();
    run_steps(&mut ctx, &["the following products should exist"]).await.unwrap();

    run_steps(&mut ctx, &[r#"I update the product with id "2" to have price "6.00""#])
        .await
        .unwrap();
    let err = run_steps(&mut ctx, &["the following products should exist"])
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::AssertionFailed(_)));

    server.stop().await.unwrap();
}

fn names_only(loaded: &str, expected: &str) -> String {
    format!(
        "Feature: Names only\nScenario: Load and check\n    Given the following products\n        | name   | description | price | available | category |\n        | Widget | d           | {} | True      | FOOD     |\n    Then the following products should exist\n        | name   | description | price | available | category |\n        | Widget | d           | {} | True      | FOOD     |\n",
        loaded, expected
    )
}

#[tokio::test]
async fn test_should_exist_matches_by_name_without_id_column() {
    let results = run_source(&names_only("19.99", "19.99"), HarnessConfig::default()).await;
    assert_eq!(results.passed, 1, "{:?}", results.results[0].error);

    let results = run_source(&names_only("19.99", "20.00"), HarnessConfig::default()).await;
    assert_eq!(results.failed, 1);
}

#[tokio::test]
async fn test_table_step_without_table() {
    let registry = StepRegistry::catalog().unwrap();
    let mut ctx = ScenarioContext::new("http://127.0.0.1:1", Duration::from_secs(1), None).unwrap();
    let matched = registry.resolve("the following products").unwrap();

    let err = steps::execute(&mut ctx, &matched, None).await.unwrap_err();
    assert!(matches!(err, E2eError::StepFailed { .. }));
}

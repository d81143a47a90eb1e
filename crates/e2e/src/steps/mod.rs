//! Step definitions
//!
//! Every sentence a feature file may use is a [`StepKind`] with a fixed
//! pattern. Patterns use `{name}` placeholders; a placeholder wrapped in double
//! quotes captures any text without quotes, a bare one captures lazily. The
//! [`StepRegistry`] compiles the patterns into anchored regexes and resolves a
//! step sentence to exactly one kind.

pub mod api;
pub mod web;

use regex::Regex;

use crate::context::ScenarioContext;
use crate::error::{E2eError, E2eResult};
use crate::feature::DataTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    // REST steps
    DatabaseEmpty,
    LoadProducts,
    LoadProductsInDatabase,
    ProductsShouldExist,
    UpdatePrice,
    DeleteProduct,
    ProductShouldNotExist,
    SearchByName,
    ShouldFindName,
    ShouldNotFindName,

    // Browser steps
    VisitHomePage,
    TitleContains,
    PageLacks,
    SetField,
    SetNamedField,
    ChangeField,
    SelectOption,
    DropdownShows,
    FieldEmpty,
    CopyField,
    PasteField,
    PressButton,
    FieldContains,
    MessageShown,
    ResultsContain,
    ProductListContains,
    ResultsLack,
    ProductListLacks,
    ResultsFieldContains,
    ResultsContainTable,
    SearchFor,
    SearchAndPress,
    ProductNotInResults,
}

impl StepKind {
    pub const ALL: [StepKind; 33] = [
        StepKind::DatabaseEmpty,
        StepKind::LoadProducts,
        StepKind::LoadProductsInDatabase,
        StepKind::ProductsShouldExist,
        StepKind::UpdatePrice,
        StepKind::DeleteProduct,
        StepKind::ProductShouldNotExist,
        StepKind::SearchByName,
        StepKind::ShouldFindName,
        StepKind::ShouldNotFindName,
        StepKind::VisitHomePage,
        StepKind::TitleContains,
        StepKind::PageLacks,
        StepKind::SetField,
        StepKind::SetNamedField,
        StepKind::ChangeField,
        StepKind::SelectOption,
        StepKind::DropdownShows,
        StepKind::FieldEmpty,
        StepKind::CopyField,
        StepKind::PasteField,
        StepKind::PressButton,
        StepKind::FieldContains,
        StepKind::MessageShown,
        StepKind::ResultsContain,
        StepKind::ProductListContains,
        StepKind::ResultsLack,
        StepKind::ProductListLacks,
        StepKind::ResultsFieldContains,
        StepKind::ResultsContainTable,
        StepKind::SearchFor,
        StepKind::SearchAndPress,
        StepKind::ProductNotInResults,
    ];

    pub fn pattern(&self) -> &'static str {
        use StepKind::*;
        match self {
            DatabaseEmpty => "the product database is empty",
            LoadProducts => "the following products",
            LoadProductsInDatabase => "the following products exist in the database:",
            ProductsShouldExist => "the following products should exist",
            UpdatePrice => r#"I update the product with id "{product_id}" to have price "{price}""#,
            DeleteProduct => r#"I delete the product with id "{product_id}""#,
            ProductShouldNotExist => r#"the product with id "{product_id}" should not exist"#,
            SearchByName => r#"I search for a product with name "{name}""#,
            ShouldFindName => r#"I should find the product with name "{name}""#,
            ShouldNotFindName => r#"I should not find the product with name "{name}""#,

            VisitHomePage => r#"I visit the "Home Page""#,
            TitleContains => r#"I should see "{message}" in the title"#,
            PageLacks => r#"I should not see "{text}""#,
            SetField => r#"I set the "{element_name}" to "{text}""#,
            SetNamedField => r#"I set the "{element_name}" field to "{text}""#,
            ChangeField => r#"I change "{element_name}" to "{text}""#,
            SelectOption => r#"I select "{option}" in the "{element_name}" dropdown"#,
            DropdownShows => r#"I should see "{text}" in the "{element_name}" dropdown"#,
            FieldEmpty => r#"the "{element_name}" field should be empty"#,
            CopyField => r#"I copy the "{element_name}" field"#,
            PasteField => r#"I paste the "{element_name}" field"#,
            PressButton => r#"I press the "{button}" button"#,
            FieldContains => r#"I should see "{text}" in the "{element_name}" field"#,
            MessageShown => r#"I should see the message "{message}""#,
            ResultsContain => r#"I should see "{text}" in the results"#,
            ProductListContains => r#"I should see "{text}" in the product list"#,
            ResultsLack => r#"I should not see "{text}" in the results"#,
            ProductListLacks => r#""{text}" should no longer appear in the product list"#,
            ResultsFieldContains => {
                r#"I should see "{text}" in the "{element_name}" field in the results"#
            }
            ResultsContainTable => "I should see the following products in the results",
            SearchFor => r#"I search for "{name}""#,
            SearchAndPress => r#"I search for "{name}" and press the "Search" button"#,
            ProductNotInResults => "I should not see the product in the results",
        }
    }

    /// Steps that drive the browser rather than the REST API
    pub fn needs_browser(&self) -> bool {
        !matches!(
            self,
            StepKind::DatabaseEmpty
                | StepKind::LoadProducts
                | StepKind::LoadProductsInDatabase
                | StepKind::ProductsShouldExist
                | StepKind::UpdatePrice
                | StepKind::DeleteProduct
                | StepKind::ProductShouldNotExist
                | StepKind::SearchByName
                | StepKind::ShouldFindName
                | StepKind::ShouldNotFindName
        )
    }

    pub fn needs_table(&self) -> bool {
        matches!(
            self,
            StepKind::LoadProducts
                | StepKind::LoadProductsInDatabase
                | StepKind::ProductsShouldExist
                | StepKind::ResultsContainTable
        )
    }
}

/// A sentence resolved against the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMatch {
    pub kind: StepKind,
    /// Captured placeholder values, in pattern order
    pub args: Vec<String>,
}

impl StepMatch {
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map(String::as_str).unwrap_or_default()
    }
}

struct StepDefinition {
    kind: StepKind,
    pattern: &'static str,
    regex: Regex,
}

#[derive(Default)]
pub struct StepRegistry {
    definitions: Vec<StepDefinition>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every catalog step
    pub fn catalog() -> E2eResult<Self> {
        let mut registry = Self::new();
        for kind in StepKind::ALL {
            registry.register(kind)?;
        }
        Ok(registry)
    }

    /// Add a step under its own pattern
    pub fn register(&mut self, kind: StepKind) -> E2eResult<()> {
        self.register_as(kind, kind.pattern())
    }

    /// Add a step under an alternative sentence; a pattern can only be
    /// registered once
    pub fn register_as(&mut self, kind: StepKind, pattern: &'static str) -> E2eResult<()> {
        if self.definitions.iter().any(|d| d.pattern == pattern) {
            return Err(E2eError::DuplicateStep(pattern.to_string()));
        }
        let (regex, _) = compile_pattern(pattern)?;
        self.definitions.push(StepDefinition {
            kind,
            pattern,
            regex,
        });
        Ok(())
    }

    /// Resolve a step sentence to the one definition matching it
    pub fn resolve(&self, text: &str) -> E2eResult<StepMatch> {
        let mut matches = self.definitions.iter().filter_map(|d| {
            d.regex.captures(text).map(|caps| {
                let matched = StepMatch {
                    kind: d.kind,
                    args: caps
                        .iter()
                        .skip(1)
                        .map(|c| c.map(|m| m.as_str().to_string()).unwrap_or_default())
                        .collect(),
                };
                (d.pattern, matched)
            })
        });

        let (first_pattern, first) = matches
            .next()
            .ok_or_else(|| E2eError::UndefinedStep(text.to_string()))?;

        let others: Vec<&str> = matches.map(|(pattern, _)| pattern).collect();
        if others.is_empty() {
            return Ok(first);
        }

        let patterns = std::iter::once(first_pattern)
            .chain(others)
            .map(str::to_string)
            .collect();
        Err(E2eError::AmbiguousStep {
            text: text.to_string(),
            patterns,
        })
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Compile a step pattern into an anchored regex, returning placeholder names
pub fn compile_pattern(pattern: &str) -> E2eResult<(Regex, Vec<String>)> {
    let mut source = String::from("^");
    let mut params = Vec::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        let literal = &rest[..open];
        let after = &rest[open + 1..];
        let Some(len) = after.find('}') else {
            break;
        };
        let tail = &after[len + 1..];

        source.push_str(&regex::escape(literal));
        if literal.ends_with('"') && tail.starts_with('"') {
            source.push_str(r#"([^"]*)"#);
        } else {
            source.push_str("(.+?)");
        }
        params.push(after[..len].to_string());
        rest = tail;
    }

    source.push_str(&regex::escape(rest));
    source.push('$');
    Ok((Regex::new(&source)?, params))
}

/// Run one resolved step against the scenario
pub async fn execute(
    ctx: &mut ScenarioContext,
    step: &StepMatch,
    table: Option<&DataTable>,
) -> E2eResult<()> {
    use StepKind::*;

    let require_table = || {
        table.ok_or_else(|| E2eError::StepFailed {
            step: step.kind.pattern().to_string(),
            reason: "step needs a data table".to_string(),
        })
    };

    match step.kind {
        DatabaseEmpty => api::empty_catalog(ctx).await,
        LoadProducts | LoadProductsInDatabase => api::load_products(ctx, require_table()?).await,
        ProductsShouldExist => api::products_should_exist(ctx, require_table()?).await,
        UpdatePrice => api::update_price(ctx, step.arg(0), step.arg(1)).await,
        DeleteProduct => api::delete_product(ctx, step.arg(0)).await,
        ProductShouldNotExist => api::product_should_not_exist(ctx, step.arg(0)).await,
        SearchByName => api::search_by_name(ctx, step.arg(0)).await,
        ShouldFindName => api::should_find_name(ctx, step.arg(0), true),
        ShouldNotFindName => api::should_find_name(ctx, step.arg(0), false),

        VisitHomePage => web::visit_home_page(ctx).await,
        TitleContains => web::title_contains(ctx, step.arg(0)).await,
        PageLacks => web::page_lacks(ctx, step.arg(0)).await,
        SetField | SetNamedField => web::set_field(ctx, step.arg(0), step.arg(1)).await,
        ChangeField => web::change_field(ctx, step.arg(0), step.arg(1)).await,
        SelectOption => web::select_option(ctx, step.arg(1), step.arg(0)).await,
        DropdownShows => web::dropdown_shows(ctx, step.arg(1), step.arg(0)).await,
        FieldEmpty => web::field_empty(ctx, step.arg(0)).await,
        CopyField => web::copy_field(ctx, step.arg(0)).await,
        PasteField => web::paste_field(ctx, step.arg(0)).await,
        PressButton => web::press_button(ctx, step.arg(0)).await,
        FieldContains => web::field_contains(ctx, step.arg(1), step.arg(0)).await,
        MessageShown => web::message_shown(ctx, step.arg(0)).await,
        ResultsContain | ProductListContains | ResultsFieldContains => {
            web::results_contain(ctx, step.arg(0)).await
        }
        ResultsLack | ProductListLacks => web::results_lack(ctx, step.arg(0)).await,
        ResultsContainTable => web::results_contain_table(ctx, require_table()?).await,
        SearchFor | SearchAndPress => web::search_for(ctx, step.arg(0)).await,
        ProductNotInResults => web::product_not_in_results(ctx).await,
    }
}

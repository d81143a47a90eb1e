//! Gherkin feature files
//!
//! Supports the subset the catalog scenarios use: `Feature`, `Background`,
//! `Scenario`, tags, `Given`/`When`/`Then`/`And`/`But` steps, data tables,
//! free-text descriptions ahead of the first step and `#` comments. Scenario
//! outlines and doc strings are rejected with a parse error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    Given,
    When,
    Then,
    And,
    But,
}

impl Keyword {
    const ALL: [Keyword; 5] = [
        Keyword::Given,
        Keyword::When,
        Keyword::Then,
        Keyword::And,
        Keyword::But,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A table attached to a step; the first row holds the headings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    pub headings: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn new(headings: Vec<String>) -> Self {
        Self {
            headings,
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = TableRow<'_>> {
        self.rows.iter().map(move |cells| TableRow {
            headings: &self.headings,
            cells,
        })
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headings.iter().any(|h| h == column)
    }
}

/// One body row of a [`DataTable`], addressed by heading
#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    headings: &'a [String],
    cells: &'a [String],
}

impl<'a> TableRow<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.headings
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.cells.get(i))
            .map(String::as_str)
    }

    pub fn require(&self, column: &str) -> E2eResult<&'a str> {
        self.get(column).ok_or_else(|| E2eError::StepFailed {
            step: "data table".to_string(),
            reason: format!("missing column '{}'", column),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub keyword: Keyword,
    pub text: String,
    pub table: Option<DataTable>,
    pub line: usize,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.keyword, self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    /// Free text between the `Scenario:` line and the first step
    pub description: String,
    /// Own tags plus those inherited from the feature, without the `@`
    pub tags: Vec<String>,
    pub steps: Vec<Step>,
    pub line: usize,
}

impl Scenario {
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim_start_matches('@');
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Steps run before every scenario
    pub background: Vec<Step>,
    pub scenarios: Vec<Scenario>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Description,
    Background,
    Scenario,
}

impl Feature {
    /// Parse feature source; `file` is only used in error messages
    pub fn parse(source: &str, file: &str) -> E2eResult<Self> {
        let parse_err = |line: usize, reason: &str| E2eError::FeatureParse {
            file: file.to_string(),
            line,
            reason: reason.to_string(),
        };

        let mut feature: Option<Feature> = None;
        let mut pending_tags: Vec<String> = Vec::new();
        let mut description: Vec<&str> = Vec::new();
        let mut section = Section::Description;

        for (idx, raw) in source.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('@') {
                pending_tags.extend(parse_tags(line).map_err(|reason| parse_err(line_no, &reason))?);
                continue;
            }

            if let Some(name) = line.strip_prefix("Feature:") {
                if feature.is_some() {
                    return Err(parse_err(line_no, "only one Feature per file"));
                }
                feature = Some(Feature {
                    name: name.trim().to_string(),
                    description: String::new(),
                    tags: std::mem::take(&mut pending_tags),
                    background: Vec::new(),
                    scenarios: Vec::new(),
                    path: None,
                });
                continue;
            }

            let current = feature
                .as_mut()
                .ok_or_else(|| parse_err(line_no, "expected 'Feature:'"))?;

            if line.starts_with("Background:") {
                if !current.scenarios.is_empty() || section == Section::Background {
                    return Err(parse_err(line_no, "Background must come once, before any Scenario"));
                }
                section = Section::Background;
                continue;
            }

            if ["Scenario Outline:", "Scenario Template:", "Examples:"]
                .iter()
                .any(|p| line.starts_with(p))
            {
                return Err(parse_err(line_no, "scenario outlines are not supported"));
            }

            if let Some(name) = line
                .strip_prefix("Scenario:")
                .or_else(|| line.strip_prefix("Example:"))
            {
                let mut tags = current.tags.clone();
                tags.append(&mut pending_tags);
                current.scenarios.push(Scenario {
                    name: name.trim().to_string(),
                    description: String::new(),
                    tags,
                    steps: Vec::new(),
                    line: line_no,
                });
                section = Section::Scenario;
                continue;
            }

            if line.starts_with("\"\"\"") || line.starts_with("```") {
                return Err(parse_err(line_no, "doc strings are not supported"));
            }

            if line.starts_with('|') {
                let cells = parse_row(line)
                    .ok_or_else(|| parse_err(line_no, "table row must end with '|'"))?;
                let step = current_steps(current, section)
                    .and_then(|steps| steps.last_mut())
                    .ok_or_else(|| parse_err(line_no, "table without a step"))?;
                match step.table.as_mut() {
                    None => step.table = Some(DataTable::new(cells)),
                    Some(table) if table.headings.len() == cells.len() => table.rows.push(cells),
                    Some(_) => return Err(parse_err(line_no, "row width differs from the headings")),
                }
                continue;
            }

            // Feature text may read like a step, so keywords only count in a section
            if let Some(steps) = current_steps(current, section) {
                if let Some((keyword, text)) = split_keyword(line) {
                    steps.push(Step {
                        keyword,
                        text: text.to_string(),
                        table: None,
                        line: line_no,
                    });
                    continue;
                }
                if !steps.is_empty() {
                    return Err(parse_err(line_no, &format!("unexpected line '{}'", line)));
                }
            }

            match section {
                Section::Description => description.push(line),
                // Background text is allowed but not kept
                Section::Background => {}
                Section::Scenario => {
                    if let Some(scenario) = current.scenarios.last_mut() {
                        if !scenario.description.is_empty() {
                            scenario.description.push('\n');
                        }
                        scenario.description.push_str(line);
                    }
                }
            }
        }

        let mut feature = feature.ok_or_else(|| parse_err(0, "no Feature found"))?;
        feature.description = description.join("\n");
        Ok(feature)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let source = std::fs::read_to_string(path)?;
        let mut feature = Self::parse(&source, &path.display().to_string())?;
        feature.path = Some(path.to_path_buf());
        Ok(feature)
    }

    /// Load every `*.feature` file under `dir`, in file name order
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut features = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "feature")
                    .unwrap_or(false)
            })
        {
            features.push(Self::from_file(entry.path())?);
        }

        Ok(features)
    }
}

fn current_steps(feature: &mut Feature, section: Section) -> Option<&mut Vec<Step>> {
    match section {
        Section::Description => None,
        Section::Background => Some(&mut feature.background),
        Section::Scenario => feature.scenarios.last_mut().map(|s| &mut s.steps),
    }
}

fn split_keyword(line: &str) -> Option<(Keyword, &str)> {
    Keyword::ALL.iter().find_map(|kw| {
        line.strip_prefix(kw.as_str())
            .filter(|rest| rest.starts_with(' '))
            .map(|rest| (*kw, rest.trim()))
    })
}

/// Tags of a `@a @b` line; a `#` word starts a trailing comment
fn parse_tags(line: &str) -> Result<Vec<String>, String> {
    let mut tags = Vec::new();
    for word in line.split_whitespace() {
        if word.starts_with('#') {
            break;
        }
        match word.strip_prefix('@') {
            Some(tag) if !tag.is_empty() => tags.push(tag.to_string()),
            _ => return Err(format!("'{}' is not a tag", word)),
        }
    }
    Ok(tags)
}

fn parse_row(line: &str) -> Option<Vec<String>> {
    let inner = line.strip_prefix('|')?.strip_suffix('|')?;
    Some(inner.split('|').map(|c| c.trim().to_string()).collect())
}

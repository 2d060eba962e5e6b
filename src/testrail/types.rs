//! Request and response types for the TestRail API.

use serde::{Deserialize, Serialize};

use crate::core::models::{RunId, sanitize_name};

/// Outcome of asking whether an identifier names a test plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanLookup {
    /// The identifier is a plan; these are the ids of its runs.
    Plan(Vec<RunId>),
    /// The identifier is not a plan and should be treated as a literal run id.
    NotAPlan,
}

/// A result to record for one case of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResult {
    pub run_id: RunId,
    pub case_id: u64,
    pub status_id: u64,
    pub comment: String,
    /// Elapsed time in whole seconds. TestRail rejects zero, callers clamp to 1.
    pub elapsed_secs: u64,
    pub browser: String,
    pub browser_version: String,
    pub environment: String,
}

/// Body of `add_result_for_case`.
#[derive(Debug, Serialize)]
pub(crate) struct AddResultBody<'a> {
    pub status_id: u64,
    pub comment: &'a str,
    pub elapsed: String,
    pub custom_browser: &'a str,
    pub custom_browser_version: &'a str,
    pub custom_environment: &'a str,
}

impl<'a> From<&'a NewResult> for AddResultBody<'a> {
    fn from(result: &'a NewResult) -> Self {
        Self {
            status_id: result.status_id,
            comment: &result.comment,
            elapsed: format!("{}s", result.elapsed_secs.max(1)),
            custom_browser: &result.browser,
            custom_browser_version: &result.browser_version,
            custom_environment: &result.environment,
        }
    }
}

/// An entry of the status dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub id: u64,
    /// System name, e.g. `passed` or `not_applicable`.
    pub name: String,
    #[serde(default)]
    pub label: String,
}

/// An entry of the test-category dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: u64,
    pub name: String,
}

impl CategoryInfo {
    /// The lookup key of the category (`Staging Test Only` -> `staging_test_only`).
    pub fn key(&self) -> String {
        sanitize_name(&self.name)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlanResponse {
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlanEntry {
    #[serde(default)]
    pub runs: Vec<RunRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunRef {
    pub id: RunId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultRecord {
    pub test_id: u64,
    #[serde(default)]
    pub created_by: Option<u64>,
    #[serde(default)]
    pub created_on: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaseField {
    #[serde(default)]
    pub system_name: String,
    #[serde(default)]
    pub configs: Vec<CaseFieldConfig>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaseFieldConfig {
    #[serde(default)]
    pub options: CaseFieldOptions,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CaseFieldOptions {
    #[serde(default)]
    pub items: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct User {
    pub id: u64,
}

/// Parses the dropdown item list of a custom field (`"1, Smoke\n2, Regression"`).
pub fn parse_dropdown_items(items: &str) -> Vec<CategoryInfo> {
    items
        .lines()
        .filter_map(|line| {
            let (id, name) = line.split_once(',')?;
            let id = id.trim().parse().ok()?;
            Some(CategoryInfo {
                id,
                name: name.trim().to_string(),
            })
        })
        .collect()
}

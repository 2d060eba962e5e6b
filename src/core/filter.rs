//! # Test Filter & Grouper / 测试过滤与分组
//!
//! Decides which tests of a run get dispatched and how they are batched.
//! Filtering is a pure function over the fetched tests; the environment
//! mismatches it reports are posted back to TestRail by the planner.
//!
//! 决定一次运行中哪些测试会被调度以及如何分批。
//! 过滤是对已获取测试的纯函数；它报告的环境不匹配由规划器回写到 TestRail。

use anyhow::{Result, bail};
use std::collections::HashSet;

use crate::core::config::EnvironmentSettings;
use crate::core::models::{TestCase, TestGroup, TestStatus, sanitize_name};
use crate::testrail::{CategoryInfo, StatusInfo};

/// Category key of tests that must only run against staging environments.
pub const STAGING_ONLY_CATEGORY: &str = "staging_test_only";
/// Category key of tests that must only run against production environments.
pub const RELEASE_ONLY_CATEGORY: &str = "release_test_only";

/// Filter configuration, built once from the command line before any run is planned.
/// 过滤配置，在规划任何运行之前根据命令行构建一次。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub accepted_statuses: HashSet<u64>,
    pub accepted_categories: HashSet<u64>,
    pub excluded_categories: HashSet<u64>,
    pub environment: String,
    pub automation_only: bool,
    pub developer_mode: bool,
    /// Id of the "Staging Test Only" category, if the instance defines one.
    pub staging_only_category: Option<u64>,
    /// Id of the "Release Test Only" category, if the instance defines one.
    pub release_only_category: Option<u64>,
    pub staging_environments: HashSet<String>,
    pub production_environments: HashSet<String>,
}

/// Raw filter input as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct FilterInput {
    pub statuses: Vec<String>,
    pub categories: Vec<String>,
    pub excluded_categories: Vec<String>,
    pub environment: String,
    pub automation_only: bool,
    pub developer_mode: bool,
}

impl FilterCriteria {
    /// Translates status and category names into remote ids.
    ///
    /// Names are matched after sanitizing (`Staging Test Only` and
    /// `staging_test_only` are the same key); plain numeric ids are accepted
    /// as well. Unknown names are rejected. An empty status or category list
    /// means "all known ids"; an empty exclusion list excludes nothing.
    pub fn from_input(
        input: &FilterInput,
        statuses: &[StatusInfo],
        categories: &[CategoryInfo],
        environments: &EnvironmentSettings,
    ) -> Result<Self> {
        let status_entries: Vec<(u64, String)> = statuses
            .iter()
            .map(|s| (s.id, sanitize_name(&s.name)))
            .collect();
        let category_entries: Vec<(u64, String)> =
            categories.iter().map(|c| (c.id, c.key())).collect();

        let mut accepted_statuses = translate("status", &input.statuses, &status_entries)?;
        if accepted_statuses.is_empty() {
            accepted_statuses = status_entries.iter().map(|(id, _)| *id).collect();
        }

        let mut accepted_categories = translate("category", &input.categories, &category_entries)?;
        if accepted_categories.is_empty() {
            accepted_categories = category_entries.iter().map(|(id, _)| *id).collect();
        }

        let excluded_categories =
            translate("category", &input.excluded_categories, &category_entries)?;

        let find_category = |key: &str| {
            category_entries
                .iter()
                .find(|(_, name)| name == key)
                .map(|(id, _)| *id)
        };

        Ok(Self {
            accepted_statuses,
            accepted_categories,
            excluded_categories,
            environment: input.environment.clone(),
            automation_only: input.automation_only,
            developer_mode: input.developer_mode,
            staging_only_category: find_category(STAGING_ONLY_CATEGORY),
            release_only_category: find_category(RELEASE_ONLY_CATEGORY),
            staging_environments: environments.staging.iter().cloned().collect(),
            production_environments: environments.production.iter().cloned().collect(),
        })
    }
}

fn translate(kind: &str, names: &[String], entries: &[(u64, String)]) -> Result<HashSet<u64>> {
    let mut ids = HashSet::new();
    for name in names {
        let key = sanitize_name(name);
        let id = entries
            .iter()
            .find(|(id, entry)| *entry == key || id.to_string() == key)
            .map(|(id, _)| *id);
        match id {
            Some(id) => {
                ids.insert(id);
            }
            None => {
                let known: Vec<&str> = entries.iter().map(|(_, n)| n.as_str()).collect();
                bail!("Unknown test {} '{}'. Known values: {}", kind, name, known.join(", "));
            }
        }
    }
    Ok(ids)
}

/// Which environment rule rejected a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentRule {
    StagingOnly,
    ReleaseOnly,
}

/// A test that was rejected because it cannot run against the target environment.
/// It is reported back to TestRail as Not Applicable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentMismatch {
    pub case: TestCase,
    pub rule: EnvironmentRule,
}

impl EnvironmentMismatch {
    pub fn status(&self) -> TestStatus {
        TestStatus::NotApplicable
    }

    pub fn comment(&self, environment: &str) -> String {
        match self.rule {
            EnvironmentRule::StagingOnly => format!(
                "This is a staging only test, but someone tried to run it on {}.",
                environment
            ),
            EnvironmentRule::ReleaseOnly => format!(
                "This is a release (prod) only test, but someone tried to run it on {}.",
                environment
            ),
        }
    }
}

/// Per-rule rejection tallies, used for the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub status_or_category: usize,
    pub not_automated: usize,
    pub manually_finalized: usize,
    pub environment: usize,
}

/// Result of filtering the tests of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub group: TestGroup,
    pub not_applicable: Vec<EnvironmentMismatch>,
    pub rejected: RejectionCounts,
}

/// Checks the status and category rules. Exclusion always wins.
pub fn matches_filters(case: &TestCase, criteria: &FilterCriteria) -> bool {
    let status_ok = criteria.accepted_statuses.contains(&case.status_id);
    let category_ok = case
        .custom_test_category
        .iter()
        .any(|c| criteria.accepted_categories.contains(c));
    let excluded = case
        .custom_test_category
        .iter()
        .any(|c| criteria.excluded_categories.contains(c));
    status_ok && category_ok && !excluded
}

fn environment_rule(case: &TestCase, criteria: &FilterCriteria) -> Option<EnvironmentRule> {
    let has = |category: Option<u64>| {
        category.is_some_and(|id| case.custom_test_category.contains(&id))
    };

    if has(criteria.staging_only_category)
        && !criteria.staging_environments.contains(&criteria.environment)
    {
        Some(EnvironmentRule::StagingOnly)
    } else if has(criteria.release_only_category)
        && !criteria.production_environments.contains(&criteria.environment)
    {
        Some(EnvironmentRule::ReleaseOnly)
    } else {
        None
    }
}

/// Filters and groups the tests of one run.
///
/// `manual_final` holds the test ids whose final result was set manually; it
/// is only consulted in automation-only mode. Surviving tests keep their fetch
/// order inside each bucket.
pub fn select_tests(
    cases: impl IntoIterator<Item = TestCase>,
    criteria: &FilterCriteria,
    manual_final: &HashSet<u64>,
) -> Selection {
    let mut selection = Selection::default();

    for case in cases {
        if !matches_filters(&case, criteria) {
            selection.rejected.status_or_category += 1;
            continue;
        }

        if case.test_name().is_none() || !(case.is_automated() || criteria.developer_mode) {
            selection.rejected.not_automated += 1;
            continue;
        }

        if criteria.automation_only && manual_final.contains(&case.id) {
            selection.rejected.manually_finalized += 1;
            continue;
        }

        if let Some(rule) = environment_rule(&case, criteria) {
            selection.rejected.environment += 1;
            selection.not_applicable.push(EnvironmentMismatch { case, rule });
            continue;
        }

        selection.group.insert(case);
    }

    selection
}

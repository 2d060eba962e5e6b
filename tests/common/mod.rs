// Shared test helpers for unit and integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use glados::core::command::{CommandOptions, RunnerKind};
use glados::core::config::EnvironmentSettings;
use glados::core::detect::ProfileDefaults;
use glados::core::filter::{FilterCriteria, FilterInput};
use glados::core::models::{AUTOMATED_TYPE_ID, RunId, RunInfo, TestCase};
use glados::core::planner::DispatchContext;
use glados::testrail::{
    CategoryInfo, NewResult, PlanLookup, StatusInfo, TestManagement, TestRailError, TestRailResult,
};

pub const STAGING_ONLY_ID: u64 = 7;
pub const RELEASE_ONLY_ID: u64 = 8;
pub const REGRESSION_ID: u64 = 1;
pub const SMOKE_ID: u64 = 2;

/// In-memory stand-in for TestRail. Posted results are recorded for inspection.
#[derive(Default)]
pub struct FakeTestRail {
    pub runs: HashMap<RunId, RunInfo>,
    pub plans: HashMap<RunId, Vec<RunId>>,
    pub tests: HashMap<RunId, Vec<TestCase>>,
    pub manual_final: HashMap<RunId, HashSet<u64>>,
    pub posted: Mutex<Vec<NewResult>>,
    /// Ids whose plan lookup fails with a server error.
    pub broken: HashSet<RunId>,
}

impl FakeTestRail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run(mut self, id: RunId, name: &str, config: Option<&str>, tests: Vec<TestCase>) -> Self {
        self.runs.insert(
            id,
            RunInfo {
                id,
                name: name.to_string(),
                config: config.map(str::to_string),
                plan_id: None,
            },
        );
        self.tests.insert(id, tests);
        self
    }

    pub fn with_plan(mut self, id: RunId, runs: &[RunId]) -> Self {
        self.plans.insert(id, runs.to_vec());
        self
    }

    pub fn posted(&self) -> Vec<NewResult> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TestManagement for FakeTestRail {
    async fn get_run(&self, run_id: RunId) -> TestRailResult<RunInfo> {
        self.runs.get(&run_id).cloned().ok_or(TestRailError::NotFound {
            resource: format!("run {}", run_id),
        })
    }

    async fn get_plan_runs(&self, id: RunId) -> TestRailResult<PlanLookup> {
        if self.broken.contains(&id) {
            return Err(TestRailError::Api {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        Ok(match self.plans.get(&id) {
            Some(runs) => PlanLookup::Plan(runs.clone()),
            None => PlanLookup::NotAPlan,
        })
    }

    async fn get_tests(&self, run_id: RunId) -> TestRailResult<Vec<TestCase>> {
        Ok(self.tests.get(&run_id).cloned().unwrap_or_default())
    }

    async fn add_result(&self, result: &NewResult) -> TestRailResult<()> {
        self.posted.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn get_statuses(&self) -> TestRailResult<Vec<StatusInfo>> {
        Ok(statuses())
    }

    async fn get_test_categories(&self) -> TestRailResult<Vec<CategoryInfo>> {
        Ok(categories())
    }

    async fn get_manual_final_results(&self, run_id: RunId) -> TestRailResult<HashSet<u64>> {
        Ok(self.manual_final.get(&run_id).cloned().unwrap_or_default())
    }
}

pub fn statuses() -> Vec<StatusInfo> {
    [
        (1, "passed", "Passed"),
        (2, "blocked", "Blocked"),
        (3, "untested", "Untested"),
        (4, "retest", "Retest"),
        (5, "failed", "Failed"),
        (6, "not_applicable", "N/A"),
    ]
    .into_iter()
    .map(|(id, name, label)| StatusInfo {
        id,
        name: name.to_string(),
        label: label.to_string(),
    })
    .collect()
}

pub fn categories() -> Vec<CategoryInfo> {
    [
        (REGRESSION_ID, "Regression"),
        (SMOKE_ID, "Smoke"),
        (STAGING_ONLY_ID, "Staging Test Only"),
        (RELEASE_ONLY_ID, "Release Test Only"),
    ]
    .into_iter()
    .map(|(id, name)| CategoryInfo {
        id,
        name: name.to_string(),
    })
    .collect()
}

/// An automated regression test named `test_<id>` in `LoginSuite`, status untested.
pub fn automated_case(id: u64) -> TestCase {
    TestCase {
        id,
        case_id: 1000 + id,
        title: format!("Case {}", id),
        status_id: 3,
        type_id: AUTOMATED_TYPE_ID,
        custom_test_category: vec![REGRESSION_ID],
        custom_automation_test_name: Some(format!("test_{}", id)),
        custom_automation_suite_name: Some("LoginSuite".to_string()),
        custom_automation_sub_suite_name: None,
    }
}

pub fn criteria(environment: &str) -> FilterCriteria {
    criteria_from(FilterInput {
        environment: environment.to_string(),
        ..FilterInput::default()
    })
}

pub fn criteria_from(input: FilterInput) -> FilterCriteria {
    FilterCriteria::from_input(&input, &statuses(), &categories(), &EnvironmentSettings::default())
        .expect("valid filter input")
}

pub fn command_options(runner: RunnerKind) -> CommandOptions {
    CommandOptions {
        runner,
        program: match runner {
            RunnerKind::Robot => "robot".to_string(),
            RunnerKind::Pytest => "python".to_string(),
        },
        working_dir: PathBuf::from("."),
        environment: "stg1".to_string(),
        remote_url: "http://grid:4444/wd/hub".to_string(),
        jenkins_url: String::new(),
        search_path: "./..".to_string(),
        pytest_test_root: "tests".to_string(),
        output_root: PathBuf::from("logs"),
        variables: Vec::new(),
        tag: None,
        timestamp: "01022024_030405".to_string(),
    }
}

pub fn profile_defaults() -> ProfileDefaults {
    ProfileDefaults {
        browser: "chrome".to_string(),
        platform: "Windows".to_string(),
        version: Some("7".to_string()),
        device: String::new(),
    }
}

pub fn dispatch_context(environment: &str, runner: RunnerKind) -> DispatchContext {
    let mut options = command_options(runner);
    options.environment = environment.to_string();
    DispatchContext {
        criteria: criteria(environment),
        defaults: profile_defaults(),
        options,
    }
}

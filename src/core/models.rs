//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures shared by the orchestration
//! pipeline: test cases as fetched from TestRail, the grouping produced by the
//! filter, the structured runner commands and their execution results.
//!
//! 此模块定义了编排流水线共享的核心数据结构：从 TestRail 获取的测试用例、
//! 过滤器生成的分组、结构化的运行器命令及其执行结果。

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::infra::t;

/// Identifier of a TestRail run or plan. The same numeric space is used for both.
/// TestRail 运行或计划的标识符。两者使用相同的数字空间。
pub type RunId = u64;

/// TestRail case type id for "Automated".
pub const AUTOMATED_TYPE_ID: u64 = 1;

/// Well-known TestRail result statuses.
/// TestRail 中众所周知的结果状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    Passed,
    Blocked,
    Untested,
    Retest,
    Failed,
    NotApplicable,
}

impl TestStatus {
    /// Returns the numeric TestRail status id.
    pub fn id(self) -> u64 {
        match self {
            TestStatus::Passed => 1,
            TestStatus::Blocked => 2,
            TestStatus::Untested => 3,
            TestStatus::Retest => 4,
            TestStatus::Failed => 5,
            TestStatus::NotApplicable => 6,
        }
    }

    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            1 => Some(TestStatus::Passed),
            2 => Some(TestStatus::Blocked),
            3 => Some(TestStatus::Untested),
            4 => Some(TestStatus::Retest),
            5 => Some(TestStatus::Failed),
            6 => Some(TestStatus::NotApplicable),
            _ => None,
        }
    }

    /// Parses a status by its TestRail system name (`passed`, `not_applicable`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match sanitize_name(name).as_str() {
            "passed" => Some(TestStatus::Passed),
            "blocked" => Some(TestStatus::Blocked),
            "untested" => Some(TestStatus::Untested),
            "retest" => Some(TestStatus::Retest),
            "failed" => Some(TestStatus::Failed),
            "not_applicable" | "n_a" | "na" => Some(TestStatus::NotApplicable),
            _ => None,
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestStatus::Passed => "passed",
            TestStatus::Blocked => "blocked",
            TestStatus::Untested => "untested",
            TestStatus::Retest => "retest",
            TestStatus::Failed => "failed",
            TestStatus::NotApplicable => "not_applicable",
        };
        f.write_str(name)
    }
}

/// Normalises a dictionary name for lookups: lower-case, with every
/// non-alphanumeric character replaced by `_`.
///
/// 规范化字典名称以便查找：转为小写，并将每个非字母数字字符替换为 `_`。
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single test of a TestRail run, restricted to the fields glados consumes.
/// TestRail 运行中的单个测试，仅包含 glados 使用的字段。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// The TestRail *test* id (unique within the run).
    pub id: u64,
    /// The TestRail *case* id the test was created from.
    pub case_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    pub status_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub type_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_test_category: Vec<u64>,
    #[serde(default)]
    pub custom_automation_test_name: Option<String>,
    #[serde(default)]
    pub custom_automation_suite_name: Option<String>,
    #[serde(default)]
    pub custom_automation_sub_suite_name: Option<String>,
}

impl TestCase {
    /// The automation test name, if present and non-blank.
    pub fn test_name(&self) -> Option<&str> {
        non_blank(self.custom_automation_test_name.as_deref())
    }

    /// The automation suite name, or an empty string when absent.
    pub fn suite_name(&self) -> &str {
        non_blank(self.custom_automation_suite_name.as_deref()).unwrap_or("")
    }

    /// The sub-suite name used for grouping, if present and non-blank.
    pub fn sub_suite(&self) -> Option<&str> {
        non_blank(self.custom_automation_sub_suite_name.as_deref())
    }

    pub fn is_automated(&self) -> bool {
        self.type_id == AUTOMATED_TYPE_ID
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Metadata of a TestRail run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub id: RunId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Free-form configuration string, e.g. "Chrome, Windows 10".
    #[serde(default)]
    pub config: Option<String>,
    #[serde(default)]
    pub plan_id: Option<u64>,
}

/// Tests selected for one run, partitioned into an ungrouped bucket and named
/// sub-suite groups. Group insertion order follows the order of first appearance.
///
/// 为一次运行选出的测试，分为未分组桶和命名的子套件分组。
/// 分组的插入顺序遵循首次出现的顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestGroup {
    pub ungrouped: Vec<TestCase>,
    pub groups: IndexMap<String, Vec<TestCase>>,
}

impl TestGroup {
    /// Routes a case to its sub-suite group, or to the ungrouped bucket.
    pub fn insert(&mut self, case: TestCase) {
        match case.sub_suite() {
            Some(sub_suite) => {
                let key = sub_suite.to_string();
                self.groups.entry(key).or_default().push(case);
            }
            None => self.ungrouped.push(case),
        }
    }

    /// Total number of test cases across all buckets.
    pub fn len(&self) -> usize {
        self.ungrouped.len() + self.groups.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of runner commands this grouping will produce:
    /// one per ungrouped case plus one per named group.
    pub fn command_count(&self) -> usize {
        self.ungrouped.len() + self.groups.len()
    }
}

/// A fully synthesized runner invocation. It is spawned directly, never through
/// a shell; `to_command_line` exists for display only.
///
/// 一个完全合成的运行器调用。它直接派生，从不经过 shell；
/// `to_command_line` 仅用于显示。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchCommand {
    pub run_id: RunId,
    /// Human-readable label, e.g. `login_suite_test_login` or a sub-suite name.
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Directory the runner writes its reports into, relative to `working_dir`.
    pub output_dir: PathBuf,
}

impl DispatchCommand {
    /// Renders the command as a shell-quoted line.
    pub fn to_command_line(&self) -> String {
        let words = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        shlex::try_join(words.clone()).unwrap_or_else(|_| words.collect::<Vec<_>>().join(" "))
    }
}

/// Outcome of one dispatched command.
/// 单个已调度命令的结果。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub command: DispatchCommand,
    /// Process exit code. `None` when the process was killed by a signal or
    /// could not be started.
    pub exit_code: Option<i32>,
    /// Set when the process could not be spawned at all.
    pub spawn_error: Option<String>,
    pub output: String,
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn is_failure(&self) -> bool {
        self.exit_code != Some(0)
    }

    /// Gets the localized status string for display.
    pub fn status_str(&self, locale: &str) -> String {
        if self.spawn_error.is_some() {
            t!("status.spawn_failed", locale = locale).to_string()
        } else if self.is_failure() {
            t!("status.failed", locale = locale).to_string()
        } else {
            t!("status.passed", locale = locale).to_string()
        }
    }

    /// Gets the CSS class used by the HTML report.
    pub fn status_class(&self) -> &'static str {
        if self.is_failure() {
            "status-Failed"
        } else {
            "status-Passed"
        }
    }
}

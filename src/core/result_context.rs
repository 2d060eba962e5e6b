//! # Result Context / 结果上下文
//!
//! Per-test state needed to report one result back to TestRail: accumulated
//! comments, an optional status override, start time and the location of the
//! test's log folder. Each test owns its own context value; nothing is global.
//!
//! 向 TestRail 报告单个结果所需的每个测试的状态：累积的评论、可选的状态覆盖、
//! 开始时间以及测试日志文件夹的位置。每个测试拥有自己的上下文值；没有全局状态。

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

use crate::core::models::{RunId, TestStatus};
use crate::testrail::NewResult;

static JENKINS_WORKSPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^.*?/jenkins/workspace/").expect("static regex"));

/// Marker that separates the Jenkins workspace from the run's log folders.
const LOG_MARKER: &str = "/glados/logs/";

/// Raw outcome of the test body, before any override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ResultContext {
    pub run_id: RunId,
    pub case_id: u64,
    pub environment: String,
    pub browser: String,
    pub browser_version: String,
    pub jenkins_url: Option<String>,
    pub output_dir: PathBuf,
    pub runner_name: String,
    started: DateTime<Utc>,
    comments: Vec<String>,
    status_override: Option<TestStatus>,
}

impl ResultContext {
    pub fn new(run_id: RunId, case_id: u64, environment: impl Into<String>) -> Self {
        Self {
            run_id,
            case_id,
            environment: environment.into(),
            browser: "none".to_string(),
            browser_version: String::new(),
            jenkins_url: None,
            output_dir: PathBuf::new(),
            runner_name: "Robot".to_string(),
            started: Utc::now(),
            comments: Vec::new(),
            status_override: None,
        }
    }

    pub fn started_at(mut self, started: DateTime<Utc>) -> Self {
        self.started = started;
        self
    }

    pub fn started(&self) -> DateTime<Utc> {
        self.started
    }

    /// Appends a comment. With `clear_previous`, earlier comments are dropped first.
    pub fn add_comment(&mut self, comment: impl Into<String>, clear_previous: bool) {
        if clear_previous {
            self.comments.clear();
        }
        self.comments.push(comment.into());
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Forces the posted status regardless of the test outcome. Typically
    /// retest, blocked or not applicable.
    pub fn override_status(&mut self, status: TestStatus) {
        self.status_override = Some(status);
    }

    pub fn final_status(&self, outcome: Outcome) -> TestStatus {
        self.status_override.unwrap_or(match outcome {
            Outcome::Passed => TestStatus::Passed,
            Outcome::Failed => TestStatus::Failed,
        })
    }

    /// Whole seconds since the start, never less than one.
    pub fn elapsed_secs(&self, end: DateTime<Utc>) -> u64 {
        let secs = (end - self.started).num_seconds();
        u64::try_from(secs).unwrap_or(0).max(1)
    }

    /// Link to the log folder: a Jenkins workspace URL when a Jenkins URL is
    /// known and the folder lives in a Jenkins workspace, a `file://` URL otherwise.
    pub fn log_url(&self) -> String {
        let output_dir = self.output_dir.display().to_string();
        self.jenkins_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .and_then(|url| jenkins_log_url(url, &output_dir))
            .unwrap_or_else(|| format!("file://{}", output_dir))
    }

    /// Formats the comment posted with the result.
    pub fn format_comment(&self, outcome: Outcome, end: DateTime<Utc>) -> String {
        let message = match outcome {
            Outcome::Passed => format!("No error messages from {}.", self.runner_name.to_lowercase()),
            Outcome::Failed => "Test failed, please check detailed report".to_string(),
        };

        let mut comment = format!(
            "The log file can be viewed [here]({}/log.html).\n\n{} Message: {}\n\nTest Start: {} UTC / GMT\nTest End  : {} UTC / GMT\n- - - -\n",
            self.log_url(),
            self.runner_name,
            message,
            self.started.format("%H:%M:%S"),
            end.format("%H:%M:%S"),
        );

        if self.comments.is_empty() {
            comment.push_str("No comments were set");
        } else {
            comment.push_str(&self.comments.join("\n"));
        }
        comment
    }

    /// Builds the result to post for this test.
    pub fn to_result(&self, outcome: Outcome, end: DateTime<Utc>) -> NewResult {
        NewResult {
            run_id: self.run_id,
            case_id: self.case_id,
            status_id: self.final_status(outcome).id(),
            comment: self.format_comment(outcome, end),
            elapsed_secs: self.elapsed_secs(end),
            browser: self.browser.clone(),
            browser_version: self.browser_version.clone(),
            environment: self.environment.clone(),
        }
    }
}

/// Maps a log folder inside a Jenkins workspace to its URL on the Jenkins server:
/// `<jenkins>/job/<build>/ws/[<subfolder>/]glados/logs/<run folder>/<test folder>`.
///
/// Returns `None` when the folder is not below a `glados/logs` directory.
pub fn jenkins_log_url(jenkins_url: &str, output_dir: &str) -> Option<String> {
    let normalized = output_dir.replace('\\', "/");
    let (workspace, logs) = normalized.split_once(LOG_MARKER)?;

    let build_path = JENKINS_WORKSPACE.replace(workspace, "");
    let (build_name, subfolder) = match build_path.split_once('/') {
        Some((build, sub)) => (build.to_string(), Some(sub.to_string())),
        None => (build_path.to_string(), None),
    };
    let (test_run, test_folder) = logs.split_once('/').unwrap_or((logs, ""));

    let mut url = format!("{}/job/{}/ws/", jenkins_url.trim_end_matches('/'), build_name);
    if let Some(sub) = subfolder.filter(|s| !s.is_empty()) {
        url.push_str(&sub);
        url.push('/');
    }
    url.push_str(&format!("glados/logs/{}/{}", test_run, test_folder));

    Some(quote_keeping_separators(&url))
}

/// Percent-encodes everything except `/` and `:`.
fn quote_keeping_separators(url: &str) -> String {
    let mut quoted = String::with_capacity(url.len());
    let mut segment = String::new();
    for c in url.chars() {
        if c == '/' || c == ':' {
            quoted.push_str(&urlencoding::encode(&segment));
            segment.clear();
            quoted.push(c);
        } else {
            segment.push(c);
        }
    }
    quoted.push_str(&urlencoding::encode(&segment));
    quoted
}

//! # Report Command Module / 结果回报命令模块
//!
//! Posts the result of a single test to TestRail, as a runner's teardown hook
//! does once a test has finished.
//!
//! 将单个测试的结果回报到 TestRail，就像运行器的收尾钩子在测试完成后所做的那样。

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use colored::*;
use std::path::PathBuf;

use super::TestRailOverrides;
use crate::core::config::GladosConfig;
use crate::core::models::{RunId, TestStatus};
use crate::core::result_context::{Outcome, ResultContext};
use crate::infra::t;
use crate::testrail::{HttpTestRail, TestManagement};

/// Arguments of `glados report`.
#[derive(Debug, Clone)]
pub struct ReportArgs {
    pub run_id: RunId,
    pub case_id: u64,
    /// `passed` or `failed`.
    pub outcome: String,
    pub override_status: Option<String>,
    pub comments: Vec<String>,
    pub environment: String,
    pub browser: String,
    pub browser_version: String,
    pub jenkins_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    /// Start of the test as Unix seconds. Defaults to now.
    pub started_at: Option<i64>,
    pub runner_name: String,
    pub config: Option<PathBuf>,
    pub testrail: TestRailOverrides,
}

impl ReportArgs {
    /// Builds the result context described by the arguments.
    pub fn to_context(&self) -> Result<(ResultContext, Outcome)> {
        let outcome = match self.outcome.as_str() {
            "passed" => Outcome::Passed,
            "failed" => Outcome::Failed,
            other => return Err(anyhow!("Unknown outcome '{}'", other)),
        };

        let mut ctx = ResultContext::new(self.run_id, self.case_id, self.environment.clone());
        if let Some(secs) = self.started_at {
            let started = DateTime::<Utc>::from_timestamp(secs, 0)
                .ok_or_else(|| anyhow!("Invalid start time {}", secs))?;
            ctx = ctx.started_at(started);
        }
        ctx.browser = self.browser.clone();
        ctx.browser_version = self.browser_version.clone();
        ctx.jenkins_url = self.jenkins_url.clone();
        ctx.runner_name = self.runner_name.clone();
        if let Some(dir) = &self.output_dir {
            ctx.output_dir = dir.clone();
        }
        for comment in &self.comments {
            ctx.add_comment(comment.clone(), false);
        }
        if let Some(name) = &self.override_status {
            let status = TestStatus::from_name(name)
                .ok_or_else(|| anyhow!("Unknown status '{}'", name))?;
            ctx.override_status(status);
        }
        Ok((ctx, outcome))
    }
}

pub async fn execute(args: ReportArgs, locale: &str) -> Result<()> {
    let config = GladosConfig::load_or_default(args.config.as_deref())?;
    let settings = args.testrail.apply(config.testrail);
    let client = HttpTestRail::new(&settings)?;

    let (ctx, outcome) = args.to_context()?;
    let result = ctx.to_result(outcome, Utc::now());
    client.add_result(&result).await.with_context(|| {
        format!(
            "Failed to post result for case {} of run {}",
            result.case_id, result.run_id
        )
    })?;

    let status = TestStatus::from_id(result.status_id)
        .map(|s| s.to_string())
        .unwrap_or_else(|| result.status_id.to_string());
    println!(
        "{}",
        t!(
            "report.posted",
            locale = locale,
            case = result.case_id,
            run = result.run_id,
            status = status
        )
        .green()
    );
    Ok(())
}

//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command: resolve the given run and plan
//! ids, select and batch their tests, launch the runner commands under a
//! bounded pool, then summarize, optionally merge reports, and fail when any
//! command failed.
//!
//! 此模块实现了 `run` 命令：解析给定的运行和计划 ID，选择并分批其测试，
//! 在有界池中启动运行器命令，然后汇总、可选地合并报告，并在任何命令失败时返回失败。

use anyhow::{Context, Result};
use chrono::Local;
use colored::*;
use std::path::{Path, PathBuf};

use super::TestRailOverrides;
use crate::{
    core::{
        aggregate::{MergeOutcome, RunSummary, merge_reports},
        command::{CommandOptions, CustomVariable, RunnerKind, TIMESTAMP_FORMAT, split_device_variable},
        config::{GladosConfig, expand_path},
        detect::ProfileDefaults,
        execution::run_commands,
        filter::{FilterCriteria, FilterInput},
        models::RunId,
        planner::{DispatchContext, plan_dispatch},
    },
    infra::t,
    reporting::{
        console::{print_failure_details, print_final_result, print_plan, print_summary},
        html::generate_html_report,
    },
    testrail::{HttpTestRail, TestManagement},
};

/// Arguments of `glados run`.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub test_run_ids: Vec<RunId>,
    pub automation_only: bool,
    pub browser: String,
    pub test_category_filter: Vec<String>,
    pub developer_mode: bool,
    pub environment: String,
    pub test_status_filter: Vec<String>,
    pub settag: Option<String>,
    pub jenkins_url: String,
    pub merge_output: bool,
    pub not_test_categories: Vec<String>,
    pub pool_size: usize,
    pub platform: String,
    pub platform_version: String,
    pub remote_url: String,
    pub search_path: String,
    pub variables: Vec<CustomVariable>,
    pub runner: RunnerKind,
    pub html: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub testrail: TestRailOverrides,
}

/// Executes the run command with the provided arguments.
///
/// Fails when a TestRail call fails, or when at least one runner command failed.
pub async fn execute(args: RunArgs, locale: &str) -> Result<()> {
    let config = GladosConfig::load_or_default(args.config.as_deref())?;
    let settings = args.testrail.apply(config.testrail.clone());
    let client = HttpTestRail::new(&settings).context("Failed to set up the TestRail client")?;

    let summary = dispatch(&client, &args, &config, locale).await?;
    if !summary.is_success() {
        anyhow::bail!("One or more failures occurred.");
    }
    Ok(())
}

/// Runs the whole pipeline against `client` and returns the failure tally.
pub async fn dispatch(
    client: &dyn TestManagement,
    args: &RunArgs,
    config: &GladosConfig,
    locale: &str,
) -> Result<RunSummary> {
    let ctx = build_context(client, args, config).await?;
    let working_dir = ctx.options.working_dir.clone();
    let output_root = ctx.options.output_root.clone();

    let plan = plan_dispatch(client, &args.test_run_ids, &ctx).await?;

    let not_applicable = plan.not_applicable_count();
    if not_applicable > 0 {
        println!(
            "{}",
            t!("run.not_applicable", locale = locale, count = not_applicable).yellow()
        );
    }

    let commands = plan.commands();
    if commands.is_empty() {
        println!("{}", t!("run.no_commands", locale = locale).green());
        return Ok(RunSummary::default());
    }

    print_plan(&plan, &working_dir.display().to_string(), locale);
    println!(
        "\n{}",
        t!(
            "run.dispatching",
            locale = locale,
            count = commands.len(),
            pool = args.pool_size.max(1)
        )
        .bold()
    );

    let results = run_commands(commands, args.pool_size, locale).await;

    print_summary(&results, locale);
    print_failure_details(&results, locale);

    if let Some(report_path) = &args.html {
        println!(
            "\n{}",
            t!("run.html_report", locale = locale, path = report_path.display())
        );
        if let Err(e) = generate_html_report(&results, report_path, locale) {
            eprintln!(
                "{} {}",
                t!("run.html_report_failed", locale = locale).red(),
                e
            );
        }
    }

    if args.merge_output {
        merge(args.runner, config, &plan.output_dirs(), &working_dir, &output_root, locale).await;
    }

    let summary = RunSummary::from_results(&results);
    print_final_result(&summary, locale);
    Ok(summary)
}

/// Builds the filter criteria, profile defaults and command options for this invocation.
async fn build_context(
    client: &dyn TestManagement,
    args: &RunArgs,
    config: &GladosConfig,
) -> Result<DispatchContext> {
    let statuses = client
        .get_statuses()
        .await
        .context("Failed to fetch test statuses")?;
    let categories = client
        .get_test_categories()
        .await
        .context("Failed to fetch test categories")?;

    let input = FilterInput {
        statuses: args.test_status_filter.clone(),
        categories: args.test_category_filter.clone(),
        excluded_categories: args.not_test_categories.clone(),
        environment: args.environment.clone(),
        automation_only: args.automation_only,
        developer_mode: args.developer_mode,
    };
    let criteria = FilterCriteria::from_input(&input, &statuses, &categories, &config.environments)?;

    let (variables, device) = split_device_variable(&args.variables);
    let defaults = ProfileDefaults {
        browser: args.browser.clone(),
        platform: args.platform.clone(),
        version: Some(args.platform_version.clone()).filter(|v| !v.is_empty()),
        device: device.unwrap_or_default(),
    };

    let (program, working_dir) = match args.runner {
        RunnerKind::Robot => (&config.runner.robot_program, &config.runner.robot_workdir),
        RunnerKind::Pytest => (&config.runner.pytest_program, &config.runner.pytest_workdir),
    };

    let options = CommandOptions {
        runner: args.runner,
        program: program.clone(),
        working_dir: expand_path(working_dir),
        environment: args.environment.clone(),
        remote_url: args.remote_url.clone(),
        jenkins_url: args.jenkins_url.clone(),
        search_path: args.search_path.clone(),
        pytest_test_root: config.runner.pytest_test_root.clone(),
        output_root: PathBuf::from(&config.runner.output_root),
        variables,
        tag: args.settag.clone().filter(|tag| !tag.is_empty()),
        timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
    };

    Ok(DispatchContext {
        criteria,
        defaults,
        options,
    })
}

async fn merge(
    runner: RunnerKind,
    config: &GladosConfig,
    output_dirs: &[PathBuf],
    working_dir: &Path,
    output_root: &Path,
    locale: &str,
) {
    if runner != RunnerKind::Robot {
        println!("{}", t!("run.merge_unsupported", locale = locale, runner = runner.to_string()).yellow());
        return;
    }

    match merge_reports(&config.runner.rebot_program, output_dirs, working_dir, output_root).await {
        MergeOutcome::Merged { inputs } => {
            println!("{}", t!("run.merge_done", locale = locale, count = inputs).green());
        }
        MergeOutcome::Skipped => {
            println!("{}", t!("run.merge_skipped", locale = locale).yellow());
        }
        MergeOutcome::Failed { reason } => {
            println!(
                "{}",
                t!("run.merge_failed", locale = locale, reason = reason.as_str()).yellow()
            );
        }
    }
}

//! # Dispatch Planner / 调度规划器
//!
//! Drives the sequential part of the pipeline: resolve identifiers, then for
//! each run fetch its tests, filter and group them, report environment
//! mismatches as Not Applicable, detect the run profile and synthesize the
//! runner commands. All state flows through an explicit [`DispatchContext`].
//!
//! 驱动流水线的顺序部分：解析标识符，然后对每个运行获取测试、过滤和分组，
//! 将环境不匹配报告为"不适用"，检测运行配置并合成运行器命令。
//! 所有状态都通过显式的 [`DispatchContext`] 传递。

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

use crate::core::command::{CommandOptions, RunTarget, sanitize_run_name, synthesize};
use crate::core::detect::{ProfileDefaults, RunProfile};
use crate::core::filter::{FilterCriteria, Selection, select_tests};
use crate::core::models::{DispatchCommand, RunId, RunInfo};
use crate::core::resolver::resolve_run_ids;
use crate::testrail::{NewResult, TestManagement};

/// Everything the pipeline needs, built once from the command line and config.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub criteria: FilterCriteria,
    pub defaults: ProfileDefaults,
    pub options: CommandOptions,
}

/// The planned work for a single run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub run: RunInfo,
    pub target: RunTarget,
    pub selection: Selection,
    pub commands: Vec<DispatchCommand>,
}

/// The planned work for every resolved run.
#[derive(Debug, Clone, Default)]
pub struct DispatchPlan {
    pub runs: Vec<RunPlan>,
}

impl DispatchPlan {
    /// All commands, run by run, in synthesis order.
    pub fn commands(&self) -> Vec<DispatchCommand> {
        self.runs.iter().flat_map(|run| run.commands.iter().cloned()).collect()
    }

    /// Output directory of every command, for the report merge.
    pub fn output_dirs(&self) -> Vec<PathBuf> {
        self.runs
            .iter()
            .flat_map(|run| run.commands.iter().map(|c| c.output_dir.clone()))
            .collect()
    }

    pub fn not_applicable_count(&self) -> usize {
        self.runs.iter().map(|run| run.selection.not_applicable.len()).sum()
    }
}

/// Plans a single run and posts Not Applicable results for its environment
/// mismatches.
pub async fn plan_run(
    client: &dyn TestManagement,
    run_id: RunId,
    ctx: &DispatchContext,
) -> Result<RunPlan> {
    let run = client
        .get_run(run_id)
        .await
        .with_context(|| format!("Failed to fetch run {}", run_id))?;

    let manual_final = if ctx.criteria.automation_only {
        client
            .get_manual_final_results(run_id)
            .await
            .with_context(|| format!("Failed to fetch results of run {}", run_id))?
    } else {
        HashSet::new()
    };

    let tests = client
        .get_tests(run_id)
        .await
        .with_context(|| format!("Failed to fetch tests of run {}", run_id))?;
    let fetched = tests.len();

    let selection = select_tests(tests, &ctx.criteria, &manual_final);

    for mismatch in &selection.not_applicable {
        let result = NewResult {
            run_id,
            case_id: mismatch.case.case_id,
            status_id: mismatch.status().id(),
            comment: mismatch.comment(&ctx.criteria.environment),
            elapsed_secs: 1,
            browser: ctx.defaults.browser.clone(),
            browser_version: String::new(),
            environment: ctx.criteria.environment.clone(),
        };
        client.add_result(&result).await.with_context(|| {
            format!(
                "Failed to mark case {} of run {} as not applicable",
                result.case_id, run_id
            )
        })?;
        info!(run_id, case_id = result.case_id, "marked not applicable");
    }

    let profile = RunProfile::detect(run.config.as_deref(), &ctx.defaults);
    let target = RunTarget {
        run_id,
        run_name: sanitize_run_name(&run.name),
        profile,
    };
    let commands = synthesize(&selection.group, &target, &ctx.options);

    info!(
        run_id,
        fetched,
        selected = selection.group.len(),
        commands = commands.len(),
        "planned run"
    );

    Ok(RunPlan {
        run,
        target,
        selection,
        commands,
    })
}

/// Resolves run and plan identifiers and plans every resulting run.
pub async fn plan_dispatch(
    client: &dyn TestManagement,
    identifiers: &[RunId],
    ctx: &DispatchContext,
) -> Result<DispatchPlan> {
    let run_ids = resolve_run_ids(client, identifiers).await;

    let mut plan = DispatchPlan::default();
    for run_id in run_ids {
        plan.runs.push(plan_run(client, run_id, ctx).await?);
    }
    Ok(plan)
}

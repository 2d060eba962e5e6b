//! # Result Aggregator / 结果汇总
//!
//! Tallies failures across all dispatched commands and optionally merges the
//! per-command Robot Framework reports into one `output.xml` with `rebot`.
//!
//! 统计所有已调度命令的失败数，并可选地使用 `rebot` 将每个命令的
//! Robot Framework 报告合并为一个 `output.xml`。

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::models::ExecutionResult;
use crate::infra::process::spawn_and_capture;

/// Name of the report file every Robot Framework run writes.
pub const REPORT_FILE: &str = "output.xml";

/// Number of results whose command exited non-zero (or never ran).
pub fn total_failures(results: &[ExecutionResult]) -> usize {
    results.iter().filter(|r| r.is_failure()).count()
}

/// Final tally of a dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_commands: usize,
    pub total_failures: usize,
}

impl RunSummary {
    pub fn from_results(results: &[ExecutionResult]) -> Self {
        Self {
            total_commands: results.len(),
            total_failures: total_failures(results),
        }
    }

    pub fn is_success(&self) -> bool {
        self.total_failures == 0
    }

    /// `FINAL RESULT: <failures>/<commands> tests failed.`
    pub fn message(&self) -> String {
        format!(
            "FINAL RESULT: {}/{} tests failed.",
            self.total_failures, self.total_commands
        )
    }
}

/// What happened to the report merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged { inputs: usize },
    /// No per-command report was found, so nothing was merged.
    Skipped,
    /// The merge tool ran but failed, or could not be started.
    Failed { reason: String },
}

/// Builds the `rebot` arguments for merging the given output directories.
///
/// `output_dirs` are relative to `working_dir` and start with `output_root`;
/// that prefix is stripped because the merge runs inside `output_root`.
/// Directories without a report file are skipped.
pub fn merge_arguments(output_dirs: &[PathBuf], working_dir: &Path, output_root: &Path) -> Vec<String> {
    let mut args = vec![
        "--merge".to_string(),
        "--output".to_string(),
        REPORT_FILE.to_string(),
    ];

    for dir in output_dirs {
        let report = working_dir.join(dir).join(REPORT_FILE);
        if !report.is_file() {
            warn!(report = %report.display(), "report missing, left out of merge");
            continue;
        }
        let relative = dir.strip_prefix(output_root).unwrap_or(dir);
        args.push(relative.join(REPORT_FILE).display().to_string());
    }

    args
}

/// Merges every available per-command report into `<output_root>/output.xml`.
/// Failures are reported through the outcome and never raised.
pub async fn merge_reports(
    program: &str,
    output_dirs: &[PathBuf],
    working_dir: &Path,
    output_root: &Path,
) -> MergeOutcome {
    let args = merge_arguments(output_dirs, working_dir, output_root);
    let inputs = args.len().saturating_sub(3);
    if inputs == 0 {
        return MergeOutcome::Skipped;
    }

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(&args).current_dir(working_dir.join(output_root));
    debug!(program, args = ?args, "merging reports");

    match spawn_and_capture(cmd).await {
        (Ok(status), _) if status.success() => MergeOutcome::Merged { inputs },
        (Ok(status), output) => {
            warn!(status = %status, output = %output, "report merge failed");
            MergeOutcome::Failed {
                reason: status.to_string(),
            }
        }
        (Err(e), _) => {
            warn!(error = %e, "could not start report merge");
            MergeOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

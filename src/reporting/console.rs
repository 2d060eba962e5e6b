//! # Console Reporting Module / 控制台报告模块
//!
//! Prints the dispatch plan, a colored per-command summary table and the
//! captured output of failed commands.
//!
//! 打印调度计划、带颜色的逐命令摘要表以及失败命令的捕获输出。

use colored::*;

use crate::core::aggregate::RunSummary;
use crate::core::models::ExecutionResult;
use crate::core::planner::DispatchPlan;
use crate::infra::t;

/// Number of trailing output lines shown per failed command.
const FAILURE_TAIL_LINES: usize = 40;

/// Prints every planned command, grouped by run.
pub fn print_plan(plan: &DispatchPlan, working_dir_hint: &str, locale: &str) {
    println!("\n{}", t!("plan.banner", locale = locale).bold());
    println!("{}", t!("plan.working_dir", locale = locale, dir = working_dir_hint).cyan());
    for run in &plan.runs {
        println!(
            "{}",
            t!(
                "plan.run_header",
                locale = locale,
                id = run.run.id,
                name = run.run.name.as_str(),
                count = run.commands.len()
            )
            .yellow()
        );
        for command in &run.commands {
            println!("  {}", command.to_command_line().dimmed());
        }
    }
}

/// Prints a formatted summary of the command results.
///
/// ```text
/// --- Dispatch Summary ---
///   - Passed     | login_suite_test_login                   |     12.30s
///   - Failed     | checkout                                 |     45.01s
/// ```
pub fn print_summary(results: &[ExecutionResult], locale: &str) {
    println!("\n{}", t!("summary.banner", locale = locale).bold());

    for result in results {
        let status_str = result.status_str(locale);
        let status_colored = if result.is_failure() {
            status_str.red()
        } else {
            status_str.green()
        };
        println!(
            "  - {:<12} | {:<40} | {:>10}",
            status_colored,
            result.command.label,
            format!("{:.2?}", result.duration)
        );
    }
}

/// Prints the tail of the captured output of every failed command.
pub fn print_failure_details(results: &[ExecutionResult], locale: &str) {
    let failures: Vec<&ExecutionResult> = results.iter().filter(|r| r.is_failure()).collect();
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("summary.failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, result) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}'",
            i + 1,
            failures.len(),
            t!("summary.failure_header", locale = locale).red(),
            result.command.label.cyan()
        );
        println!("{}", result.command.to_command_line().dimmed());

        if let Some(error) = &result.spawn_error {
            println!("{}", t!("summary.spawn_error", locale = locale, error = error.as_str()).red());
        } else {
            let lines: Vec<&str> = result.output.lines().collect();
            let start = lines.len().saturating_sub(FAILURE_TAIL_LINES);
            for line in &lines[start..] {
                println!("    {}", line);
            }
        }
        println!("{}", "-".repeat(80));
    }
}

/// Prints the final tally line.
pub fn print_final_result(summary: &RunSummary, locale: &str) {
    let line = summary.message();
    if summary.is_success() {
        println!("\n{}", line.green().bold());
        println!("{}", t!("summary.all_passed", locale = locale).green().bold());
    } else {
        println!("\n{}", line.red().bold());
    }
}

//! # Execution Engine / 执行引擎
//!
//! Runs the synthesized commands under a bounded worker pool. Commands start
//! in list order, at most `pool_size` at a time. A failing or unspawnable
//! command is recorded and never stops the others; there is no retry and no
//! cancellation.
//!
//! 在有界工作池下运行合成的命令。命令按列表顺序启动，同时最多运行 `pool_size` 个。
//! 失败或无法派生的命令会被记录，但不会阻止其他命令；没有重试，也没有取消。

use colored::*;
use futures::{StreamExt, stream};
use std::time::Instant;
use tracing::{debug, error};

use crate::core::models::{DispatchCommand, ExecutionResult};
use crate::infra::process::{build_command, spawn_and_capture};
use crate::infra::t;

/// Executes one command to completion.
pub async fn run_command(command: DispatchCommand, locale: &str) -> ExecutionResult {
    debug!(label = %command.label, cmd = %command.to_command_line(), "starting runner");
    let start = Instant::now();
    let (status, output) = spawn_and_capture(build_command(&command)).await;
    let duration = start.elapsed();

    let result = match status {
        Ok(status) => ExecutionResult {
            command,
            exit_code: status.code(),
            spawn_error: None,
            output,
            duration,
        },
        Err(e) => {
            error!(program = %command.program, error = %e, "failed to spawn runner");
            ExecutionResult {
                command,
                exit_code: None,
                spawn_error: Some(e.to_string()),
                output,
                duration,
            }
        }
    };

    if result.is_failure() {
        println!(
            "{} {}",
            t!("exec.failure", locale = locale).red().bold(),
            result.command.label
        );
    } else {
        println!(
            "{} {}",
            t!("exec.success", locale = locale).green().bold(),
            result.command.label
        );
    }

    result
}

/// Runs every command with at most `pool_size` running concurrently.
/// Results come back in command order regardless of completion order.
pub async fn run_commands(
    commands: Vec<DispatchCommand>,
    pool_size: usize,
    locale: &str,
) -> Vec<ExecutionResult> {
    let pool_size = pool_size.max(1);

    let mut results: Vec<(usize, ExecutionResult)> = stream::iter(commands.into_iter().enumerate())
        .map(|(index, command)| {
            let locale = locale.to_string();
            let label = command.label.clone();
            let fallback = command.clone();
            async move {
                let result = match tokio::spawn(async move { run_command(command, &locale).await }).await {
                    Ok(result) => result,
                    Err(e) => {
                        // The worker task itself panicked or was aborted.
                        error!(label = %label, error = %e, "runner task failed");
                        ExecutionResult {
                            command: fallback,
                            exit_code: None,
                            spawn_error: Some(e.to_string()),
                            output: String::new(),
                            duration: Default::default(),
                        }
                    }
                };
                (index, result)
            }
        })
        .buffer_unordered(pool_size)
        .collect()
        .await;

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}

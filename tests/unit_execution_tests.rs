//! # Execution Engine Unit Tests / 执行引擎单元测试
//!
//! Runs small shell commands through the bounded pool and checks exit-code
//! handling, output capture, ordering and the concurrency bound.
//!
//! 通过有界池运行小型 shell 命令，检查退出码处理、输出捕获、顺序和并发上限。

#![cfg(unix)]

use glados::core::execution::{run_command, run_commands};
use glados::core::models::DispatchCommand;
use std::path::PathBuf;
use std::time::{Duration, Instant};

fn shell(label: &str, script: &str) -> DispatchCommand {
    DispatchCommand {
        run_id: 1,
        label: label.to_string(),
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        working_dir: PathBuf::from("."),
        output_dir: PathBuf::from("logs").join(label),
    }
}

#[cfg(test)]
mod run_command_tests {
    use super::*;

    #[tokio::test]
    async fn test_success_captures_output() {
        let result = run_command(shell("ok", "echo hello; echo oops 1>&2"), "en").await;
        assert!(!result.is_failure());
        assert_eq!(result.exit_code, Some(0));
        assert!(result.output.contains("hello"));
        assert!(result.output.contains("oops"));
        assert!(result.spawn_error.is_none());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_a_failure() {
        let result = run_command(shell("bad", "exit 3"), "en").await;
        assert!(result.is_failure());
        assert_eq!(result.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_missing_program_is_a_failure() {
        let mut command = shell("missing", "");
        command.program = "glados-no-such-runner-binary".to_string();
        let result = run_command(command, "en").await;
        assert!(result.is_failure());
        assert_eq!(result.exit_code, None);
        assert!(result.spawn_error.is_some());
        assert_eq!(result.status_str("en"), "Not started");
    }

    #[tokio::test]
    async fn test_non_utf8_output_does_not_fail_a_passing_command() {
        // Latin-1 的 "café" 之后仍有大量输出，读取端不能提前关闭管道
        let script = "printf 'caf\\351\\n'; sleep 0.3; i=0; while [ $i -lt 2000 ]; do echo line $i; i=$((i+1)); done; exit 0";
        let result = run_command(shell("latin1", script), "en").await;

        assert_eq!(result.exit_code, Some(0));
        assert!(!result.is_failure());
        assert!(result.output.starts_with("caf\u{FFFD}\n"));
        assert!(result.output.contains("line 1999"));
        assert_eq!(result.output.lines().count(), 2001);
    }

    #[tokio::test]
    async fn test_working_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let mut command = shell("pwd", "pwd");
        command.working_dir = dir.path().to_path_buf();
        let result = run_command(command, "en").await;
        let name = dir.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(result.output.contains(&name));
    }
}

#[cfg(test)]
mod run_commands_tests {
    use super::*;

    #[tokio::test]
    async fn test_results_follow_command_order() {
        // 第一个命令最慢，但结果仍按命令顺序返回
        let commands = vec![
            shell("slow", "sleep 0.3; echo slow"),
            shell("fast", "echo fast"),
            shell("failing", "exit 1"),
        ];
        let results = run_commands(commands, 3, "en").await;

        let labels: Vec<&str> = results.iter().map(|r| r.command.label.as_str()).collect();
        assert_eq!(labels, vec!["slow", "fast", "failing"]);
        assert!(!results[0].is_failure());
        assert!(results[2].is_failure());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_other_commands() {
        let commands: Vec<_> = (0..10)
            .map(|i| {
                let script = if i % 3 == 0 { "exit 1" } else { "true" };
                shell(&format!("cmd_{}", i), script)
            })
            .collect();

        let results = run_commands(commands, 4, "en").await;

        assert_eq!(results.len(), 10);
        assert_eq!(results.iter().filter(|r| r.is_failure()).count(), 4);
    }

    #[tokio::test]
    async fn test_pool_bounds_concurrency() {
        let commands: Vec<_> = (0..4).map(|i| shell(&format!("sleep_{}", i), "sleep 0.4")).collect();

        let start = Instant::now();
        let results = run_commands(commands, 2, "en").await;
        let elapsed = start.elapsed();

        assert_eq!(results.len(), 4);
        // 两个并发槽位运行四个 0.4 秒的命令至少需要两轮
        assert!(elapsed >= Duration::from_millis(750), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_zero_pool_size_still_runs() {
        let results = run_commands(vec![shell("only", "true")], 0, "en").await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_failure());
    }

    #[tokio::test]
    async fn test_empty_command_list() {
        assert!(run_commands(Vec::new(), 4, "en").await.is_empty());
    }
}

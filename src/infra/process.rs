//! # Process Module / 进程模块
//!
//! Spawns runner processes and captures their combined output.
//!
//! 派生运行器进程并捕获其合并输出。

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::warn;

use crate::core::models::DispatchCommand;

/// Builds the `tokio::process::Command` for a dispatch command. No shell is
/// involved, so arguments reach the runner exactly as synthesized.
pub fn build_command(command: &DispatchCommand) -> Command {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args).current_dir(&command.working_dir);
    cmd
}

/// Spawns a command and captures its stdout and stderr.
/// The output streams are read concurrently and combined into a single string.
///
/// # Returns
/// A tuple containing:
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - The combined stdout and stderr as a `String`.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
/// 输出流被并发读取并合并到一个字符串中。
pub async fn spawn_and_capture(mut cmd: Command) -> (std::io::Result<std::process::ExitStatus>, String) {
    let mut child = match cmd
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return (Err(e), String::new()),
    };

    // Use an Arc<Mutex<String>> to allow concurrent writes from stdout and stderr tasks.
    // 使用 Arc<Mutex<String>> 来允许多个任务（stdout 和 stderr）并发写入。
    let output = Arc::new(tokio::sync::Mutex::new(String::new()));

    let stdout_handle = child
        .stdout
        .take()
        .map(|stdout| tokio::spawn(collect_lines(stdout, Arc::clone(&output))));
    let stderr_handle = child
        .stderr
        .take()
        .map(|stderr| tokio::spawn(collect_lines(stderr, Arc::clone(&output))));

    let status = child.wait().await;

    // Wait for both readers so no trailing output is lost.
    // 等待两个读取任务完成，以免丢失尾部输出。
    for handle in [stdout_handle, stderr_handle].into_iter().flatten() {
        if let Err(e) = handle.await {
            warn!(error = %e, "failed to join output reader");
        }
    }

    let captured = output.lock().await.clone();
    (status, captured)
}

/// Reads `stream` to the end, one line at a time. Bytes that are not valid
/// UTF-8 are replaced rather than ending the read, so the child never sees a
/// closed pipe while it is still writing.
async fn collect_lines<R>(stream: R, output: Arc<tokio::sync::Mutex<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let mut output = output.lock().await;
                output.push_str(line.trim_end_matches(['\r', '\n']));
                output.push('\n');
            }
            Err(e) => {
                warn!(error = %e, "failed to read runner output, discarding the rest");
                if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                    warn!(error = %e, "failed to drain runner output");
                }
                break;
            }
        }
    }
}

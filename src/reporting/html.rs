//! # HTML Reporting Module / HTML 报告模块
//!
//! Renders a standalone HTML page listing every dispatched runner command,
//! its outcome, duration and captured output.
//!
//! 渲染一个独立的 HTML 页面，列出每个已调度的运行器命令、其结果、持续时间和捕获的输出。

use anyhow::{Context, Result};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;

use crate::core::aggregate::RunSummary;
use crate::core::models::ExecutionResult;
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Builds the report markup.
pub fn render_report(results: &[ExecutionResult], locale: &str) -> Markup {
    let summary = RunSummary::from_results(results);
    let passed = summary.total_commands - summary.total_failures;

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale)) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.main_header", locale = locale)) }
                div class="summary-container" {
                    div class="summary-item" {
                        span class="count" { (summary.total_commands) }
                        span class="label" { (t!("html_report.summary.total", locale = locale)) }
                    }
                    div class="summary-item" {
                        span class="count passed-text" { (passed) }
                        span class="label" { (t!("html_report.summary.passed", locale = locale)) }
                    }
                    div class="summary-item" {
                        span class="count failed-text" { (summary.total_failures) }
                        span class="label" { (t!("html_report.summary.failed", locale = locale)) }
                    }
                }
                table {
                    thead {
                        tr {
                            th { (t!("html_report.table.header.run", locale = locale)) }
                            th { (t!("html_report.table.header.name", locale = locale)) }
                            th class="status-col" { (t!("html_report.table.header.status", locale = locale)) }
                            th class="duration-cell" { (t!("html_report.table.header.duration", locale = locale)) }
                        }
                    }
                    tbody {
                        @for result in results {
                            tr {
                                td { (result.command.run_id) }
                                td {
                                    details {
                                        summary { (result.command.label) }
                                        code { (result.command.to_command_line()) }
                                        @if let Some(error) = &result.spawn_error {
                                            pre class="output" { (error) }
                                        } @else if !result.output.is_empty() {
                                            pre class="output" { (result.output) }
                                        }
                                    }
                                }
                                td class=(result.status_class()) { (result.status_str(locale)) }
                                td class="duration-cell" { (format!("{:.2?}", result.duration)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Writes the HTML report to `output_path`.
pub fn generate_html_report(results: &[ExecutionResult], output_path: &Path, locale: &str) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let markup = render_report(results, locale);
    fs::write(output_path, markup.into_string())
        .with_context(|| format!("Failed to write HTML report to {}", output_path.display()))
}

//! # Reporting Module / 报告模块
//!
//! This module prints the colored console summary of a dispatch and renders
//! the optional HTML report listing every runner command and its outcome.
//!
//! 此模块打印调度的彩色控制台摘要，
//! 并渲染列出每个运行器命令及其结果的可选 HTML 报告。

pub mod console;
pub mod html;

// Re-export common reporting functions
pub use console::{print_failure_details, print_summary};
pub use html::generate_html_report;

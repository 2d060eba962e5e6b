//! # Glados Library / Glados 库
//!
//! This library provides the core functionality for the `glados` tool, a
//! TestRail-driven orchestrator that turns test runs and plans into parallel
//! Robot Framework or pytest invocations.
//!
//! 此库为 `glados` 工具提供核心功能，
//! 这是一个由 TestRail 驱动的编排器，将测试运行和测试计划转换为并行的 Robot Framework 或 pytest 调用。
//!
//! ## Modules / 模块
//!
//! - `core` - Data models, filtering, command synthesis and the execution engine
//! - `testrail` - Test-management client contract and its HTTP implementation
//! - `infra` - Process spawning, port allocation and device-name parsing
//! - `reporting` - Console summary and HTML report
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 数据模型、过滤、命令合成和执行引擎
//! - `testrail` - 测试管理客户端契约及其 HTTP 实现
//! - `infra` - 进程派生、端口分配和设备名称解析
//! - `reporting` - 控制台摘要和 HTML 报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;
pub mod testrail;

// Re-export commonly used items
pub use crate::core::config;
pub use crate::core::models;
pub use crate::core::planner;

/// Picks the message locale from the system settings.
///
/// The full locale (e.g. "zh-CN") is tried first, then the bare language code,
/// and finally "en".
pub fn detect_locale() -> String {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    if available_locales.contains(&locale.as_str()) {
        return locale;
    }
    locale
        .split('-')
        .next()
        .filter(|lang_code| available_locales.contains(lang_code))
        .unwrap_or("en")
        .to_string()
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");

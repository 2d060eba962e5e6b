//! # Core Module / 核心模块
//!
//! This module contains the orchestration pipeline of glados: data models,
//! configuration, run resolution, filtering, command synthesis, execution and
//! result aggregation.
//!
//! 此模块包含 glados 的编排流水线：数据模型、配置、运行解析、过滤、
//! 命令合成、执行和结果汇总。

pub mod aggregate;
pub mod command;
pub mod config;
pub mod detect;
pub mod execution;
pub mod filter;
pub mod models;
pub mod planner;
pub mod resolver;
pub mod result_context;

// Re-exports
pub use config::GladosConfig;
pub use models::{DispatchCommand, ExecutionResult, TestCase};
pub use planner::{DispatchContext, plan_run};

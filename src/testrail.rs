//! # Test-Management Client / 测试管理客户端
//!
//! The orchestrator only ever talks to TestRail through the [`TestManagement`]
//! trait, so the pipeline can be driven by the HTTP client in production and by
//! an in-memory fake in tests.
//!
//! 编排器只通过 [`TestManagement`] trait 与 TestRail 通信，
//! 因此流水线在生产中由 HTTP 客户端驱动，在测试中由内存模拟驱动。

pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;
use std::collections::HashSet;

use crate::core::models::{RunId, RunInfo, TestCase};

pub use client::HttpTestRail;
pub use error::{TestRailError, TestRailResult};
pub use types::{CategoryInfo, NewResult, PlanLookup, StatusInfo};

/// Operations consumed from the test-management service.
#[async_trait]
pub trait TestManagement: Send + Sync {
    /// Run metadata including its configuration string.
    async fn get_run(&self, run_id: RunId) -> TestRailResult<RunInfo>;

    /// Run ids of a plan, or [`PlanLookup::NotAPlan`] when `id` is not a plan.
    async fn get_plan_runs(&self, id: RunId) -> TestRailResult<PlanLookup>;

    /// Tests of a run, in the order the service returns them.
    async fn get_tests(&self, run_id: RunId) -> TestRailResult<Vec<TestCase>>;

    async fn add_result(&self, result: &NewResult) -> TestRailResult<()>;

    async fn get_statuses(&self) -> TestRailResult<Vec<StatusInfo>>;

    async fn get_test_categories(&self) -> TestRailResult<Vec<CategoryInfo>>;

    /// Ids of the tests of a run whose latest result was set by a person
    /// rather than by the automation account.
    async fn get_manual_final_results(&self, run_id: RunId) -> TestRailResult<HashSet<u64>>;
}

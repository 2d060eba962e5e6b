//! # Run/Plan Resolver / 运行与计划解析器
//!
//! Expands user-supplied identifiers into the set of run ids to dispatch.
//! An identifier that names a plan contributes all of its runs; any other
//! identifier is taken as a literal run id. A failed plan lookup is not fatal:
//! the identifier falls through as a run id and any real problem surfaces when
//! that run is fetched.
//!
//! 将用户提供的标识符展开为要调度的运行 ID 集合。
//! 命名计划的标识符会贡献其所有运行；其他标识符按字面运行 ID 处理。
//! 计划查询失败不是致命错误：该标识符按运行 ID 处理，真正的问题会在获取该运行时暴露。

use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::core::models::RunId;
use crate::testrail::{PlanLookup, TestManagement};

/// Resolves identifiers to a deduplicated, ascending set of run ids.
pub async fn resolve_run_ids(client: &dyn TestManagement, identifiers: &[RunId]) -> BTreeSet<RunId> {
    let mut run_ids = BTreeSet::new();

    for &identifier in identifiers {
        match client.get_plan_runs(identifier).await {
            Ok(PlanLookup::Plan(runs)) => {
                debug!(plan = identifier, runs = ?runs, "expanded plan");
                run_ids.extend(runs);
            }
            Ok(PlanLookup::NotAPlan) => {
                run_ids.insert(identifier);
            }
            Err(e) => {
                warn!(id = identifier, error = %e, "plan lookup failed, treating id as a run");
                run_ids.insert(identifier);
            }
        }
    }

    run_ids
}

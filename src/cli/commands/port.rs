//! # Port Command Module / 端口命令模块
//!
//! Claims and releases device-server ports in the shared tracking table.
//! `claim` prints only the port number on stdout so scripts can capture it.
//!
//! 在共享跟踪表中占用和释放设备服务器端口。
//! `claim` 仅在标准输出中打印端口号，便于脚本捕获。

use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

use crate::core::config::GladosConfig;
use crate::infra::ports::PortSelector;
use crate::infra::t;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortAction {
    /// Claim `port`, or a random free port when none is given.
    Claim { testcase: String, port: Option<u16> },
    Release { port: u16 },
    ReleaseStale,
    List,
}

pub fn execute(
    action: PortAction,
    config: Option<PathBuf>,
    database: Option<PathBuf>,
    locale: &str,
) -> Result<()> {
    let config = GladosConfig::load_or_default(config.as_deref())?;
    let path = database.unwrap_or_else(|| config.ports.database_path());
    let mut selector = PortSelector::open(&path, &config.ports)
        .with_context(|| format!("Failed to open port database {}", path.display()))?;

    match action {
        PortAction::Claim { testcase, port } => {
            let port = match port {
                Some(port) => {
                    selector.claim_port(port, &testcase)?;
                    port
                }
                None => selector.claim_free_port(&testcase)?,
            };
            println!("{}", port);
        }
        PortAction::Release { port } => {
            if selector.release_port(port)? {
                println!("{}", t!("port.released", locale = locale, port = port).green());
            } else {
                println!("{}", t!("port.not_claimed", locale = locale, port = port).yellow());
            }
        }
        PortAction::ReleaseStale => {
            let removed = selector.release_stale_ports()?;
            println!("{}", t!("port.stale_released", locale = locale, count = removed).green());
        }
        PortAction::List => {
            let claims = selector.claims()?;
            if claims.is_empty() {
                println!("{}", t!("port.none_claimed", locale = locale));
            }
            for claim in claims {
                println!(
                    "  - {:<6} | {:<40} | {}",
                    claim.port, claim.testcase, claim.claimed_at
                );
            }
        }
    }
    Ok(())
}

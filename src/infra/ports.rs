//! # Port Selector / 端口选择器
//!
//! Hands out device-server ports from a fixed range, tracked in a shared SQLite
//! table so that parallel test processes never pick the same port. A claim
//! records the test name and a timestamp; claims older than the configured
//! TTL are considered stale and can be swept.
//!
//! 从固定范围分配设备服务器端口，并记录在共享的 SQLite 表中，
//! 以便并行测试进程不会选择相同的端口。每次占用会记录测试名称和时间戳；
//! 超过配置 TTL 的占用被视为过期，可以被清理。

use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{Connection, ErrorCode, OptionalExtension, TransactionBehavior, params};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::core::config::PortSettings;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS port_tracking (
    port INTEGER PRIMARY KEY,
    testcase TEXT NOT NULL,
    claimed_at TEXT NOT NULL
)";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Port allocation errors.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("port database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("could not create port database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("every port between {min} and {max} is claimed")]
    Exhausted { min: u16, max: u16 },

    #[error("port {port} is already claimed")]
    AlreadyClaimed { port: u16 },

    #[error("invalid port range {min}-{max}")]
    InvalidRange { min: u16, max: u16 },
}

pub type PortResult<T> = Result<T, PortError>;

/// A port claim as stored in the tracking table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortClaim {
    pub port: u16,
    pub testcase: String,
    pub claimed_at: String,
}

pub struct PortSelector {
    conn: Connection,
    min: u16,
    max: u16,
    stale_after: Duration,
}

impl PortSelector {
    /// Opens (and if needed creates) the tracking database at `path`.
    pub fn open(path: &Path, settings: &PortSettings) -> PortResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn, settings)
    }

    pub fn open_in_memory(settings: &PortSettings) -> PortResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, settings)
    }

    fn with_connection(conn: Connection, settings: &PortSettings) -> PortResult<Self> {
        if settings.min_port > settings.max_port {
            return Err(PortError::InvalidRange {
                min: settings.min_port,
                max: settings.max_port,
            });
        }
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn,
            min: settings.min_port,
            max: settings.max_port,
            stale_after: Duration::from_secs(settings.stale_after_minutes.saturating_mul(60)),
        })
    }

    /// Ports currently claimed, in ascending order.
    pub fn ports_in_use(&self) -> PortResult<Vec<u16>> {
        let mut stmt = self.conn.prepare("SELECT port FROM port_tracking ORDER BY port")?;
        let ports = stmt
            .query_map([], |row| row.get::<_, u16>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ports)
    }

    pub fn claims(&self) -> PortResult<Vec<PortClaim>> {
        let mut stmt = self
            .conn
            .prepare("SELECT port, testcase, claimed_at FROM port_tracking ORDER BY port")?;
        let claims = stmt
            .query_map([], |row| {
                Ok(PortClaim {
                    port: row.get(0)?,
                    testcase: row.get(1)?,
                    claimed_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(claims)
    }

    /// Picks a random port in range that is not currently claimed.
    pub fn generate_free_port(&self) -> PortResult<u16> {
        let in_use: HashSet<u16> = self.ports_in_use()?.into_iter().collect();
        pick_free(self.min, self.max, &in_use)
    }

    /// Records `port` as claimed by `testcase` at the current time.
    pub fn claim_port(&self, port: u16, testcase: &str) -> PortResult<()> {
        self.claim_port_at(port, testcase, Utc::now())
    }

    /// Records a claim with an explicit timestamp.
    pub fn claim_port_at(&self, port: u16, testcase: &str, at: DateTime<Utc>) -> PortResult<()> {
        insert_claim(&self.conn, port, testcase, at)
    }

    /// Picks and claims a free port in one transaction. Stale claims are
    /// dropped first, so their ports are available again.
    pub fn claim_free_port(&mut self, testcase: &str) -> PortResult<u16> {
        let cutoff = self.stale_cutoff();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let reclaimed = delete_claims_before(&tx, cutoff)?;
        if reclaimed > 0 {
            debug!(reclaimed, "reclaimed stale ports");
        }
        let in_use: HashSet<u16> = {
            let mut stmt = tx.prepare("SELECT port FROM port_tracking")?;
            let rows = stmt.query_map([], |row| row.get::<_, u16>(0))?;
            rows.collect::<Result<_, _>>()?
        };
        let port = pick_free(self.min, self.max, &in_use)?;
        insert_claim(&tx, port, testcase, Utc::now())?;
        tx.commit()?;
        debug!(port, testcase, "claimed port");
        Ok(port)
    }

    /// Removes the claim on `port`. Returns whether a claim existed.
    pub fn release_port(&self, port: u16) -> PortResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM port_tracking WHERE port = ?1", params![port])?;
        Ok(removed > 0)
    }

    /// Removes claims older than the stale TTL. Returns how many were removed.
    pub fn release_stale_ports(&self) -> PortResult<usize> {
        let removed = delete_claims_before(&self.conn, self.stale_cutoff())?;
        debug!(removed, "released stale ports");
        Ok(removed)
    }

    fn stale_cutoff(&self) -> DateTime<Utc> {
        let ttl = chrono::Duration::from_std(self.stale_after).unwrap_or(chrono::Duration::MAX);
        Utc::now()
            .checked_sub_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// The test that holds `port`, if any.
    pub fn holder(&self, port: u16) -> PortResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT testcase FROM port_tracking WHERE port = ?1",
                params![port],
                |row| row.get(0),
            )
            .optional()?)
    }
}

fn delete_claims_before(conn: &Connection, cutoff: DateTime<Utc>) -> PortResult<usize> {
    Ok(conn.execute(
        "DELETE FROM port_tracking WHERE claimed_at < ?1",
        params![cutoff.format(TIMESTAMP_FORMAT).to_string()],
    )?)
}

fn insert_claim(conn: &Connection, port: u16, testcase: &str, at: DateTime<Utc>) -> PortResult<()> {
    let result = conn.execute(
        "INSERT INTO port_tracking (port, testcase, claimed_at) VALUES (?1, ?2, ?3)",
        params![port, testcase, at.format(TIMESTAMP_FORMAT).to_string()],
    );
    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(PortError::AlreadyClaimed { port })
        }
        Err(e) => Err(e.into()),
    }
}

fn pick_free(min: u16, max: u16, in_use: &HashSet<u16>) -> PortResult<u16> {
    let range_size = usize::from(max - min) + 1;
    let used_in_range = in_use.iter().filter(|p| (min..=max).contains(*p)).count();
    if used_in_range >= range_size {
        return Err(PortError::Exhausted { min, max });
    }

    let mut rng = rand::thread_rng();
    loop {
        let port = rng.gen_range(min..=max);
        if !in_use.contains(&port) {
            return Ok(port);
        }
    }
}

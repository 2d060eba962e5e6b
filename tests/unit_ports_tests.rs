//! # Port Selector Unit Tests / 端口选择器单元测试
//!
//! Claims, releases and stale sweeps against in-memory and on-disk SQLite
//! tracking tables.
//!
//! 针对内存和磁盘上的 SQLite 跟踪表测试占用、释放和过期清理。

use chrono::{Duration, Utc};
use glados::core::config::PortSettings;
use glados::infra::ports::{PortError, PortSelector};
use tempfile::tempdir;

fn settings(min_port: u16, max_port: u16) -> PortSettings {
    PortSettings {
        min_port,
        max_port,
        ..PortSettings::default()
    }
}

#[cfg(test)]
mod claim_tests {
    use super::*;

    #[test]
    fn test_claim_free_port_stays_in_range() {
        let mut selector = PortSelector::open_in_memory(&settings(30000, 30009)).unwrap();
        let port = selector.claim_free_port("login_test").unwrap();
        assert!((30000..=30009).contains(&port));
        assert_eq!(selector.holder(port).unwrap().as_deref(), Some("login_test"));
    }

    #[test]
    fn test_claimed_ports_are_never_handed_out_twice() {
        let mut selector = PortSelector::open_in_memory(&settings(30000, 30004)).unwrap();
        let mut ports: Vec<u16> = (0..5)
            .map(|i| selector.claim_free_port(&format!("test_{}", i)).unwrap())
            .collect();
        ports.sort_unstable();
        assert_eq!(ports, vec![30000, 30001, 30002, 30003, 30004]);

        // 范围已满
        assert!(matches!(
            selector.claim_free_port("one_too_many"),
            Err(PortError::Exhausted { min: 30000, max: 30004 })
        ));
    }

    #[test]
    fn test_explicit_claim_conflicts() {
        let selector = PortSelector::open_in_memory(&settings(30000, 30010)).unwrap();
        selector.claim_port(30005, "first").unwrap();
        assert!(matches!(
            selector.claim_port(30005, "second"),
            Err(PortError::AlreadyClaimed { port: 30005 })
        ));
        assert_eq!(selector.ports_in_use().unwrap(), vec![30005]);
    }

    #[test]
    fn test_generate_free_port_skips_claimed() {
        let selector = PortSelector::open_in_memory(&settings(30000, 30001)).unwrap();
        selector.claim_port(30000, "first").unwrap();
        for _ in 0..20 {
            assert_eq!(selector.generate_free_port().unwrap(), 30001);
        }
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        assert!(matches!(
            PortSelector::open_in_memory(&settings(30010, 30000)),
            Err(PortError::InvalidRange { .. })
        ));
    }
}

#[cfg(test)]
mod release_tests {
    use super::*;

    #[test]
    fn test_release_port() {
        let selector = PortSelector::open_in_memory(&settings(30000, 30010)).unwrap();
        selector.claim_port(30001, "a").unwrap();

        assert!(selector.release_port(30001).unwrap());
        assert!(!selector.release_port(30001).unwrap());
        assert_eq!(selector.holder(30001).unwrap(), None);
    }

    #[test]
    fn test_release_stale_ports_keeps_fresh_claims() {
        let selector = PortSelector::open_in_memory(&settings(30000, 30010)).unwrap();
        let now = Utc::now();
        selector.claim_port_at(30001, "old", now - Duration::hours(5)).unwrap();
        selector.claim_port_at(30002, "fresh", now - Duration::minutes(5)).unwrap();

        assert_eq!(selector.release_stale_ports().unwrap(), 1);
        let claims = selector.claims().unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].port, 30002);
        assert_eq!(claims[0].testcase, "fresh");
    }

    #[test]
    fn test_claim_reclaims_stale_ports_in_a_full_range() {
        let mut selector = PortSelector::open_in_memory(&settings(30000, 30001)).unwrap();
        let now = Utc::now();
        selector.claim_port_at(30000, "abandoned", now - Duration::hours(3)).unwrap();
        selector.claim_port_at(30001, "running", now - Duration::minutes(10)).unwrap();

        // 范围已满，但过期的占用会在同一事务中被回收
        let port = selector.claim_free_port("next_test").unwrap();
        assert_eq!(port, 30000);
        assert_eq!(selector.holder(30000).unwrap().as_deref(), Some("next_test"));
        assert_eq!(selector.holder(30001).unwrap().as_deref(), Some("running"));
    }

    #[test]
    fn test_huge_stale_ttl_keeps_every_claim() {
        let config = PortSettings {
            stale_after_minutes: u64::MAX,
            ..settings(30000, 30010)
        };
        let selector = PortSelector::open_in_memory(&config).unwrap();
        selector
            .claim_port_at(30001, "ancient", Utc::now() - Duration::days(3650))
            .unwrap();

        assert_eq!(selector.release_stale_ports().unwrap(), 0);
        assert_eq!(selector.ports_in_use().unwrap(), vec![30001]);
    }

    #[test]
    fn test_claims_persist_across_connections() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("nested").join("ports.db");
        let config = settings(30000, 30010);

        {
            let selector = PortSelector::open(&db, &config).unwrap();
            selector.claim_port(30003, "persisted").unwrap();
        }

        let reopened = PortSelector::open(&db, &config).unwrap();
        assert_eq!(reopened.holder(30003).unwrap().as_deref(), Some("persisted"));
    }
}

//! # Configuration Module / 配置模块
//!
//! Loads the optional `Glados.toml` file. Every key has a default, so an empty
//! file (or no file at all) yields a working configuration; command-line flags
//! take precedence over anything read here.
//!
//! 加载可选的 `Glados.toml` 文件。每个键都有默认值，因此空文件（或没有文件）
//! 也能得到可用的配置；命令行参数优先于此处读取的任何内容。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Glados.toml";

/// Represents the whole glados configuration, loaded from a TOML file.
/// 代表从 TOML 文件加载的整个 glados 配置。
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct GladosConfig {
    /// The language for output messages (e.g., "en", "zh-CN").
    /// 输出消息的语言（例如 "en", "zh-CN"）。
    pub language: String,
    pub testrail: TestRailSettings,
    pub runner: RunnerSettings,
    pub environments: EnvironmentSettings,
    pub ports: PortSettings,
}

impl Default for GladosConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            testrail: TestRailSettings::default(),
            runner: RunnerSettings::default(),
            environments: EnvironmentSettings::default(),
            ports: PortSettings::default(),
        }
    }
}

/// Connection settings for the TestRail API.
/// TestRail API 的连接设置。
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TestRailSettings {
    /// Base URL of the TestRail instance, e.g. `https://example.testrail.io`.
    pub url: String,
    pub user: String,
    pub api_key: String,
    /// User id that automation results are posted under. Results created by any
    /// other user count as manually finalized. Looked up by `user` when absent.
    pub automation_user_id: Option<u64>,
    pub timeout_secs: u64,
}

impl Default for TestRailSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            user: String::new(),
            api_key: String::new(),
            automation_user_id: None,
            timeout_secs: 30,
        }
    }
}

/// Programs and directories used to launch the test runners.
/// 用于启动测试运行器的程序和目录。
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunnerSettings {
    pub robot_program: String,
    pub robot_workdir: String,
    pub pytest_program: String,
    pub pytest_workdir: String,
    /// Directory, relative to `pytest_workdir`, that keyword-selected pytest runs collect from.
    pub pytest_test_root: String,
    pub rebot_program: String,
    /// Root directory for runner reports, relative to the runner working directory.
    pub output_root: String,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            robot_program: "robot".to_string(),
            robot_workdir: ".".to_string(),
            pytest_program: "python".to_string(),
            pytest_workdir: "../../tests".to_string(),
            pytest_test_root: "tests".to_string(),
            rebot_program: "rebot".to_string(),
            output_root: "logs".to_string(),
        }
    }
}

/// Allowlists used by the staging-only and release-only category rules.
/// 仅限预发布和仅限发布类别规则使用的允许列表。
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnvironmentSettings {
    pub staging: Vec<String>,
    pub production: Vec<String>,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        let mut staging: Vec<String> = (1..=10).map(|n| format!("stg{n}")).collect();
        staging.push("qa1".to_string());
        let production = ["prod", "preprd2", "preprd3", "preprd4", "prd", "www"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self { staging, production }
    }
}

/// Shared port-allocation table settings.
/// 共享端口分配表的设置。
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PortSettings {
    /// SQLite database holding the claimed ports. `~` is expanded.
    pub database: String,
    pub min_port: u16,
    pub max_port: u16,
    pub stale_after_minutes: u64,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            database: "~/.glados/ports.db".to_string(),
            min_port: 29170,
            max_port: 29980,
            stale_after_minutes: 120,
        }
    }
}

impl PortSettings {
    pub fn database_path(&self) -> PathBuf {
        expand_path(&self.database)
    }
}

/// Expands `~` and environment variables in a configured path.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

impl GladosConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Loads an explicit config file, or `Glados.toml` from the working directory
    /// if it exists, or falls back to defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Renders the configuration as TOML, as written by `glados init`.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

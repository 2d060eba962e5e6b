//! # Subcommands / 子命令
//!
//! One module per `glados` subcommand. Shared here: TestRail connection flags
//! that override the `[testrail]` section of the configuration file.
//!
//! 每个 `glados` 子命令对应一个模块。此处共享：覆盖配置文件 `[testrail]` 部分的 TestRail 连接参数。

use crate::core::config::TestRailSettings;

pub mod device;
pub mod init;
pub mod port;
pub mod report;
pub mod run;

/// TestRail connection values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct TestRailOverrides {
    pub url: Option<String>,
    pub user: Option<String>,
    pub api_key: Option<String>,
}

impl TestRailOverrides {
    /// Returns `settings` with every given value replaced.
    pub fn apply(&self, mut settings: TestRailSettings) -> TestRailSettings {
        if let Some(url) = self.url.as_ref().filter(|v| !v.is_empty()) {
            settings.url = url.clone();
        }
        if let Some(user) = self.user.as_ref().filter(|v| !v.is_empty()) {
            settings.user = user.clone();
        }
        if let Some(api_key) = self.api_key.as_ref().filter(|v| !v.is_empty()) {
            settings.api_key = api_key.clone();
        }
        settings
    }
}

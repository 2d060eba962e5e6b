//! # Init Command Module / 初始化命令模块
//!
//! Writes a `Glados.toml` holding every setting at its default value, with the
//! language set to the locale the command ran under.
//!
//! 写入一个包含所有默认设置的 `Glados.toml`，其中语言设置为命令运行时的区域设置。

use anyhow::{Context, Result};
use colored::*;
use std::{fs, path::Path};

use crate::core::config::GladosConfig;
use crate::infra::t;

const HEADER: &str = "# glados configuration / glados 配置
# Command-line flags and TESTRAIL_* environment variables override these values.
# 命令行参数和 TESTRAIL_* 环境变量会覆盖这些值。

";

/// Executes the init command.
///
/// # Arguments
/// * `output` - Path for the new configuration file
/// * `force` - Whether to overwrite an existing file
pub fn execute(output: &Path, force: bool, locale: &str) -> Result<()> {
    if output.exists() && !force {
        println!(
            "{}",
            t!("init.file_exists", locale = locale, path = output.display()).red()
        );
        println!("{}", t!("init.use_force", locale = locale).yellow());
        return Ok(());
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            t!("init.create_parent_dir_failed", locale = locale, path = parent.display()).to_string()
        })?;
    }

    let config = GladosConfig {
        language: locale.to_string(),
        ..GladosConfig::default()
    };
    let body = config.to_toml_string()?;
    fs::write(output, format!("{HEADER}{body}")).with_context(|| {
        t!("init.write_failed", locale = locale, path = output.display()).to_string()
    })?;

    println!(
        "{}",
        t!("init.success", locale = locale, path = output.display()).green()
    );
    println!("{}", t!("init.next_steps", locale = locale));
    Ok(())
}

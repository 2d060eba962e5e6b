//! `glados device`: prints the full device name for an alias.

use anyhow::Result;
use colored::*;

use crate::infra::device::parse_device_name;
use crate::infra::t;

pub fn execute(alias: &str, locale: &str) -> Result<()> {
    let device = parse_device_name(alias)?;
    println!(
        "{}",
        t!(
            "device.resolved",
            locale = locale,
            name = device.full_name.as_str(),
            platform = device.platform.to_string()
        )
        .green()
    );
    Ok(())
}

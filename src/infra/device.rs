//! # Device Name Parser / 设备名称解析器
//!
//! Normalises device aliases found in run configurations and custom variables
//! (`iphone8plus`, `ipadpro12.9`, `android9`) into the full device name expected
//! by the device farm, together with its platform.
//!
//! 将运行配置和自定义变量中的设备别名（`iphone8plus`、`ipadpro12.9`、`android9`）
//! 规范化为设备农场所需的完整设备名称及其平台。

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static ANDROID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(android)?(emulator)?([\d.]+)$").expect("static regex"));
static IOS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^i(phone|pad)(.*)$").expect("static regex"));
static IPHONE_MODEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)(s)?(plus)?|(\w{1,2})(max)?").expect("static regex"));
static IPAD_MODEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(air|pro)?(2)?([\d.]+)?(inch|in)?(\d[stndrh]{2})?(gen.*)?$").expect("static regex")
});
static VAGUE_ANDROID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(android)?(emulator)?$").expect("static regex"));
static VAGUE_IOS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^i(phone|pad(air)?)$").expect("static regex"));

const DEFAULT_IPHONE: &str = "iphone6";
const DEFAULT_IPAD: &str = "ipadair2";
const DEFAULT_ANDROID: &str = "androidemulator8";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeviceNameError {
    #[error("device name '{0}' matches neither the iOS nor the Android format")]
    Unrecognized(String),

    #[error("'{0}' is not a known iPhone model")]
    UnknownIphone(String),

    #[error("'{0}' is not a known iPad model")]
    UnknownIpad(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePlatform {
    Ios,
    Android,
}

impl fmt::Display for DevicePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevicePlatform::Ios => f.write_str("iOS"),
            DevicePlatform::Android => f.write_str("Android"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceName {
    pub full_name: String,
    pub platform: DevicePlatform,
}

/// Parses a raw device alias.
///
/// Case and whitespace are ignored. The vague aliases `iphone`, `ipad`,
/// `ipadair`, `android`, `emulator` and the empty string resolve to default
/// devices.
pub fn parse_device_name(raw: &str) -> Result<DeviceName, DeviceNameError> {
    let mut device: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if VAGUE_IOS.is_match(&device) {
        let default = if device == "iphone" { DEFAULT_IPHONE } else { DEFAULT_IPAD };
        device = default.to_string();
    } else if VAGUE_ANDROID.is_match(&device) {
        device = DEFAULT_ANDROID.to_string();
    }

    if let Some(caps) = IOS.captures(&device) {
        let model = caps.get(2).map_or("", |m| m.as_str());
        let full_name = match caps.get(1).map(|m| m.as_str()) {
            Some("phone") => iphone_name(model)?,
            _ => ipad_name(model)?,
        };
        return Ok(DeviceName {
            full_name,
            platform: DevicePlatform::Ios,
        });
    }

    if let Some(caps) = ANDROID.captures(&device) {
        let version = caps.get(3).map_or("", |m| m.as_str());
        return Ok(DeviceName {
            full_name: format!("AndroidEmulator{}", version),
            platform: DevicePlatform::Android,
        });
    }

    Err(DeviceNameError::Unrecognized(raw.to_string()))
}

fn iphone_name(model: &str) -> Result<String, DeviceNameError> {
    let caps = IPHONE_MODEL
        .captures(model)
        .ok_or_else(|| DeviceNameError::UnknownIphone(model.to_string()))?;
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());

    let mut name = String::from("iPhone");
    if !group(1).is_empty() {
        name.push(' ');
        name.push_str(group(1));
    }
    name.push_str(group(2));
    if !group(3).is_empty() {
        name.push(' ');
        name.push_str(&title(group(3)));
    }
    if !group(4).is_empty() {
        name.push(' ');
        name.push_str(&group(4).to_uppercase());
    }
    if !group(5).is_empty() {
        name.push(' ');
        name.push_str(&title(group(5)));
    }
    Ok(name)
}

fn ipad_name(model: &str) -> Result<String, DeviceNameError> {
    let caps = IPAD_MODEL
        .captures(model)
        .ok_or_else(|| DeviceNameError::UnknownIpad(model.to_string()))?;
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());

    let mut name = String::from("iPad");
    if !group(1).is_empty() {
        name.push(' ');
        name.push_str(&title(group(1)));
    }
    if !group(2).is_empty() {
        name.push(' ');
        name.push_str(group(2));
    }
    if !group(3).is_empty() {
        name.push_str(&format!(" ({}-inch)", group(3)));
    }
    if !group(5).is_empty() {
        name.push_str(&format!(" ({} generation)", group(5)));
    }
    Ok(name)
}

fn title(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

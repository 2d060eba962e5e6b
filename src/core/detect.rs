//! # Run Profile Detection / 运行配置检测
//!
//! TestRail runs carry a free-form configuration string such as
//! `"Chrome, Windows 10"` or `"iPhone XS Max, iOS 12 (Landscape)"`. This module
//! derives the browser, platform, device and orientation from it by keyword
//! matching, falling back to the command-line defaults.
//!
//! TestRail 运行带有自由格式的配置字符串，例如 `"Chrome, Windows 10"`。
//! 此模块通过关键字匹配从中推导浏览器、平台、设备和方向，并回退到命令行默认值。

use once_cell::sync::Lazy;
use regex::Regex;

macro_rules! pattern {
    ($re:expr) => {
        Lazy::new(|| Regex::new($re).expect("static regex"))
    };
}

static CHROME: Lazy<Regex> = pattern!(r"\b(chrome|googlechrome|gc)\b");
static FIREFOX: Lazy<Regex> = pattern!(r"\b(firefox|ff)\b");
static INTERNET_EXPLORER: Lazy<Regex> = pattern!(r"\b(ie|internet explorer)\b");
static PHANTOMJS: Lazy<Regex> = pattern!(r"\bphantomjs\b");
static SAFARI: Lazy<Regex> = pattern!(r"\bsafari\b");
static EDGE: Lazy<Regex> = pattern!(r"\bedge\b");

static WINDOWS_7: Lazy<Regex> = pattern!(r"\b(windows7|win7|vista|windows 7)\b");
static WINDOWS_10: Lazy<Regex> = pattern!(r"\b(windows10|win10|windows 10)\b");
static WINDOWS: Lazy<Regex> = pattern!(r"\bwindows\b");
static MAC: Lazy<Regex> = pattern!(r"\bmac\b");
static IOS: Lazy<Regex> = pattern!(r"\bios(\d*)?\b");

static IPHONE_DEVICE: Lazy<Regex> = pattern!(r"\biphone(\s?(\d|x)s?)?(\s?max)?\b");
static IPAD_DEVICE: Lazy<Regex> = pattern!(r"\bipad\s?(air|pro)?\s?\d?\b");
static ANDROID_DEVICE: Lazy<Regex> = pattern!(r"\bandroid(\s?emulator)?(\s?\d*(.\d)*)\b");
static PHONE_ON_IOS: Lazy<Regex> = pattern!(r"\bphone.*ios(\d*)?\b");

static LANDSCAPE: Lazy<Regex> = pattern!(r"(?i)landscape");

/// Values used when the run configuration does not name them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub browser: String,
    pub platform: String,
    pub version: Option<String>,
    /// Device from a `device:<name>` custom variable, or empty.
    pub device: String,
}

/// Browser, platform and device a run targets.
/// 一次运行所针对的浏览器、平台和设备。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProfile {
    pub browser: String,
    pub platform: String,
    pub version: Option<String>,
    pub device: String,
    pub landscape: bool,
}

impl RunProfile {
    /// Detects the profile of a run from its configuration string.
    pub fn detect(config: Option<&str>, defaults: &ProfileDefaults) -> Self {
        let raw = config.unwrap_or("");
        let lowered = raw.to_lowercase();

        let browser = detect_browser(&lowered)
            .map(str::to_string)
            .unwrap_or_else(|| defaults.browser.clone());

        let mut platform = defaults.platform.to_lowercase();
        let mut version = defaults.version.clone();
        if let Some((detected, detected_version)) = detect_platform(&lowered) {
            platform = detected.to_string();
            if let Some(v) = detected_version {
                version = Some(v.to_string());
            }
        }

        let device = detect_device(&lowered).unwrap_or_else(|| defaults.device.clone());

        Self {
            browser,
            platform,
            version,
            device,
            landscape: detect_landscape(raw),
        }
    }

    /// Directory fragment `<platform><version>[_<device>]_<browser>`.
    pub fn directory_tag(&self) -> String {
        let mut tag = self.platform.clone();
        if let Some(version) = &self.version {
            tag.push_str(version);
        }
        if !self.device.is_empty() {
            tag.push('_');
            tag.push_str(&self.device);
        }
        tag.push('_');
        tag.push_str(&self.browser);
        tag
    }
}

/// Returns the browser named by a lower-cased run configuration.
pub fn detect_browser(config: &str) -> Option<&'static str> {
    if CHROME.is_match(config) {
        Some("chrome")
    } else if FIREFOX.is_match(config) {
        Some("firefox")
    } else if INTERNET_EXPLORER.is_match(config) {
        Some("internetexplorer")
    } else if PHANTOMJS.is_match(config) {
        Some("phantomjs")
    } else if SAFARI.is_match(config) {
        Some("safari")
    } else if EDGE.is_match(config) {
        Some("edge")
    } else {
        None
    }
}

/// Returns the platform, and the version when the configuration pins one.
pub fn detect_platform(config: &str) -> Option<(&'static str, Option<&'static str>)> {
    if WINDOWS_7.is_match(config) {
        Some(("windows", Some("7")))
    } else if WINDOWS_10.is_match(config) {
        Some(("windows", Some("10")))
    } else if WINDOWS.is_match(config) {
        Some(("windows", None))
    } else if MAC.is_match(config) {
        Some(("mac", None))
    } else if IOS.is_match(config) || IPHONE_DEVICE.is_match(config) || IPAD_DEVICE.is_match(config)
    {
        Some(("ios", None))
    } else if ANDROID_DEVICE.is_match(config) {
        Some(("android", None))
    } else {
        None
    }
}

/// Returns the device alias with whitespace removed, e.g. `iphonexsmax`.
pub fn detect_device(config: &str) -> Option<String> {
    let found = [&*IPHONE_DEVICE, &*IPAD_DEVICE, &*ANDROID_DEVICE]
        .into_iter()
        .find_map(|re| re.find(config).map(|m| m.as_str().to_string()))
        .or_else(|| PHONE_ON_IOS.is_match(config).then(|| "iphone".to_string()))?;

    Some(found.chars().filter(|c| !c.is_whitespace()).collect())
}

pub fn detect_landscape(config: &str) -> bool {
    LANDSCAPE.is_match(config)
}

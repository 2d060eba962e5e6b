//! # Device Name Unit Tests / 设备名称单元测试

use glados::infra::device::{DeviceNameError, DevicePlatform, parse_device_name};

fn full_name(alias: &str) -> String {
    parse_device_name(alias).unwrap().full_name
}

#[cfg(test)]
mod iphone_tests {
    use super::*;

    #[test]
    fn test_numbered_models() {
        assert_eq!(full_name("iphone8"), "iPhone 8");
        assert_eq!(full_name("iPhone 8 Plus"), "iPhone 8 Plus");
        assert_eq!(full_name("iphone6s"), "iPhone 6s");
        assert_eq!(full_name("iphone6splus"), "iPhone 6s Plus");
    }

    #[test]
    fn test_letter_models() {
        assert_eq!(full_name("iphonex"), "iPhone X");
        assert_eq!(full_name("iphonexsmax"), "iPhone XS Max");
        assert_eq!(full_name("iphonexr"), "iPhone XR");
    }

    #[test]
    fn test_vague_alias_uses_default() {
        let device = parse_device_name("iPhone").unwrap();
        assert_eq!(device.full_name, "iPhone 6");
        assert_eq!(device.platform, DevicePlatform::Ios);
    }
}

#[cfg(test)]
mod ipad_tests {
    use super::*;

    #[test]
    fn test_models() {
        assert_eq!(full_name("ipadair2"), "iPad Air 2");
        assert_eq!(full_name("ipadpro12.9"), "iPad Pro (12.9-inch)");
        assert_eq!(full_name("ipadpro12.9inch3rdgen"), "iPad Pro (12.9-inch) (3rd generation)");
    }

    #[test]
    fn test_vague_aliases_use_default() {
        assert_eq!(full_name("ipad"), "iPad Air 2");
        assert_eq!(full_name("iPad Air"), "iPad Air 2");
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        assert!(matches!(
            parse_device_name("ipadmini"),
            Err(DeviceNameError::UnknownIpad(_))
        ));
    }
}

#[cfg(test)]
mod android_tests {
    use super::*;

    #[test]
    fn test_versions() {
        assert_eq!(full_name("android9"), "AndroidEmulator9");
        assert_eq!(full_name("Android Emulator 8.1"), "AndroidEmulator8.1");
        assert_eq!(full_name("7"), "AndroidEmulator7");
    }

    #[test]
    fn test_vague_aliases_use_default() {
        let device = parse_device_name("").unwrap();
        assert_eq!(device.full_name, "AndroidEmulator8");
        assert_eq!(device.platform, DevicePlatform::Android);
        assert_eq!(full_name("emulator"), "AndroidEmulator8");
    }

    #[test]
    fn test_unrecognized_alias() {
        assert_eq!(
            parse_device_name("pixel"),
            Err(DeviceNameError::Unrecognized("pixel".to_string()))
        );
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(DevicePlatform::Ios.to_string(), "iOS");
        assert_eq!(DevicePlatform::Android.to_string(), "Android");
    }
}

//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for glados, including process
//! spawning, shared port allocation, device-name parsing and i18n support.
//!
//! 此模块为 glados 提供基础设施服务，
//! 包括进程派生、共享端口分配、设备名称解析和国际化支持。

pub mod device;
pub mod ports;
pub mod process;

// Re-export i18n functions for easier access
pub use rust_i18n::t;

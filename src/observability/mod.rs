//! 可观测性：tracing 订阅器初始化
//!
//! stdout 留给报告、stderr 留给错误 JSON，因此日志只写入 [logging].file；
//! 未配置日志文件时不安装订阅器，RUST_LOG 与 [logging].level 都不生效。

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSection;

/// 按配置安装全局订阅器；级别优先取 RUST_LOG，其次 [logging].level，默认 off。
/// 返回是否配置了日志输出。
pub fn init(cfg: &LoggingSection) -> std::io::Result<bool> {
    let Some(path) = &cfg.file else {
        return Ok(false);
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.level.as_deref().unwrap_or("off")));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init();
    if installed.is_err() {
        // 重复初始化（如测试中）保留已有订阅器
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(true)
}

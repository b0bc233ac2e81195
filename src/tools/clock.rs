//! 时钟工具：返回当前本地时间，给后续检索建立时间上下文

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use serde_json::Value;

use crate::tools::{Tool, CLOCK_TOOL};

/// 时间来源
pub trait Clock: Send + Sync {
    /// 形如 `2024-05-01 13:45:00`
    fn now(&self) -> String;
}

/// 系统本地时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

pub struct ClockTool {
    clock: Arc<dyn Clock>,
}

impl ClockTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl Tool for ClockTool {
    fn name(&self) -> &str {
        CLOCK_TOOL
    }

    fn description(&self) -> &str {
        "Returns the current date and time. The first step of every plan must call this tool to establish temporal context."
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        Ok(self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_format() {
        let now = SystemClock.now();
        assert!(chrono::NaiveDateTime::parse_from_str(&now, "%Y-%m-%d %H:%M:%S").is_ok());
    }
}

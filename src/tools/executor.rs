//! 工具执行器
//!
//! 持有 ToolRegistry 与全局超时，dispatch(tool_name, args) 在超时内调用 registry.execute，
//! 成功、失败、超时、未知工具一律返回观察文本（从不向上抛错）；每次调用输出结构化审计日志（JSON）。

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::timeout;

use crate::tools::ToolRegistry;

/// 单次调度的结果：成功文本或错误文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ok(String),
    Err(String),
}

impl DispatchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, DispatchOutcome::Ok(_))
    }

    pub fn text(&self) -> &str {
        match self {
            DispatchOutcome::Ok(s) | DispatchOutcome::Err(s) => s,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            DispatchOutcome::Ok(s) | DispatchOutcome::Err(s) => s,
        }
    }
}

/// 工具执行器：对每次调用施加超时，并将结果映射为 DispatchOutcome
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 执行指定工具；超时返回 `Error during <tool>: timed out after Ns`，输出 JSON 审计日志
    pub async fn dispatch(&self, tool_name: &str, args: Value) -> DispatchOutcome {
        let start = Instant::now();
        let args_preview = args_preview(&args);
        let result = timeout(self.timeout, self.registry.execute(tool_name, args)).await;

        let (outcome, label) = match result {
            Ok(Ok(content)) => (DispatchOutcome::Ok(content), "ok"),
            Ok(Err(e)) => (DispatchOutcome::Err(e), "error"),
            Err(_) => (
                DispatchOutcome::Err(format!(
                    "Error during {}: timed out after {}s",
                    tool_name,
                    self.timeout.as_secs()
                )),
                "timeout",
            ),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": outcome.is_ok(),
            "outcome": label,
            "duration_ms": duration_ms,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");
        if let DispatchOutcome::Err(e) = &outcome {
            tracing::warn!(tool = %tool_name, error = %e, "tool dispatch failed, continuing");
        }

        outcome
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::json;

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Sleeps."
        }

        async fn execute(&self, _args: Value) -> Result<String, String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("done".to_string())
        }
    }

    #[tokio::test]
    async fn test_timeout_becomes_observation() {
        let mut registry = ToolRegistry::new();
        registry.register(SlowTool);
        let executor = ToolExecutor {
            registry: Arc::new(registry),
            timeout: Duration::from_millis(20),
        };
        let outcome = executor.dispatch("slow", json!({})).await;
        assert!(!outcome.is_ok());
        assert!(outcome.text().starts_with("Error during slow: timed out after"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_observation() {
        let executor = ToolExecutor::new(Arc::new(ToolRegistry::new()), 1);
        let outcome = executor.dispatch("warp", json!({})).await;
        assert_eq!(outcome, DispatchOutcome::Err("Unknown tool: warp".to_string()));
    }
}

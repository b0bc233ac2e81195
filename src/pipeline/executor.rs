//! 计划执行：按顺序调度每一步，累积观察日志
//!
//! 单步失败（网络、超时、文件、未知工具）在调度边界内已转为观察文本，后续步骤照常执行。

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::pipeline::Plan;
use crate::tools::ToolExecutor;

/// 一步的执行记录
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// 从 1 开始
    pub index: usize,
    pub tool: String,
    pub parameters: BTreeMap<String, Value>,
    pub text: String,
    pub ok: bool,
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = serde_json::to_string(&self.parameters).map_err(|_| fmt::Error)?;
        write!(
            f,
            "\n--- Step {}: Executing {} with parameters {} ---\nObservation: {}\n",
            self.index, self.tool, params, self.text
        )
    }
}

/// 只追加的观察日志；执行结束后按值交给综合阶段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationLog {
    records: Vec<Observation>,
}

impl ObservationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observation: Observation) {
        self.records.push(observation);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.records.iter().filter(|o| !o.ok).count()
    }

    /// 拼成给综合 prompt 使用的文本块
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ObservationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            write!(f, "{record}")?;
        }
        Ok(())
    }
}

pub struct PlanExecutor {
    tools: ToolExecutor,
}

impl PlanExecutor {
    pub fn new(tools: ToolExecutor) -> Self {
        Self { tools }
    }

    /// 严格按计划顺序执行，每步完成后才开始下一步
    pub async fn execute_plan(&self, plan: &Plan) -> ObservationLog {
        let mut log = ObservationLog::new();
        for (i, step) in plan.steps().iter().enumerate() {
            tracing::info!(step = i + 1, tool = %step.tool, "executing plan step");
            let outcome = self.tools.dispatch(&step.tool, step.arguments()).await;
            log.push(Observation {
                index: i + 1,
                tool: step.tool.clone(),
                parameters: step.parameters.clone(),
                ok: outcome.is_ok(),
                text: outcome.into_text(),
            });
        }
        tracing::info!(steps = log.len(), failures = log.failures(), "plan executed");
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::stub_registry;
    use crate::pipeline::PlanStep;
    use serde_json::json;
    use std::sync::Arc;

    fn executor() -> PlanExecutor {
        PlanExecutor::new(ToolExecutor::new(Arc::new(stub_registry()), 5))
    }

    #[tokio::test]
    async fn test_steps_recorded_in_order() {
        let plan = Plan::new(vec![
            PlanStep::new("get_current_date", json!({})),
            PlanStep::new("google_search", json!({"query": "alpha"})),
            PlanStep::new("google_search", json!({"query": "beta"})),
        ]);
        let log = executor().execute_plan(&plan).await;
        let indices: Vec<usize> = log.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        let texts: Vec<&str> = log.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts[0], "2024-05-01 09:30:00");
        assert!(texts[1].contains("alpha"));
        assert!(texts[2].contains("beta"));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_steps() {
        let plan = Plan::new(vec![
            PlanStep::new("get_current_date", json!({})),
            PlanStep::new("scrape_website", json!({"url": "https://unreachable.invalid/"})),
            PlanStep::new("google_search", json!({"query": "bridge"})),
        ]);
        let log = executor().execute_plan(&plan).await;
        assert_eq!(log.len(), 3);
        let records: Vec<&Observation> = log.iter().collect();
        assert!(!records[1].ok);
        assert_eq!(records[1].text, "Failed to retrieve content from the URL.");
        assert!(records[2].ok);
        assert!(records[2].text.contains("bridge"));
        assert_eq!(log.failures(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_observation() {
        let plan = Plan::new(vec![
            PlanStep::new("get_current_date", json!({})),
            PlanStep::new("teleport", json!({})),
            PlanStep::new("google_search", json!({"query": "after"})),
        ]);
        let log = executor().execute_plan(&plan).await;
        let records: Vec<&Observation> = log.iter().collect();
        assert_eq!(records[1].text, "Unknown tool: teleport");
        assert!(records[2].ok);
    }

    #[test]
    fn test_render_format() {
        let mut log = ObservationLog::new();
        log.push(Observation {
            index: 1,
            tool: "google_search".to_string(),
            parameters: [("query".to_string(), json!("x"))].into_iter().collect(),
            text: "No search results found for this query with the time filter 'none'.".to_string(),
            ok: true,
        });
        assert_eq!(
            log.render(),
            "\n--- Step 1: Executing google_search with parameters {\"query\":\"x\"} ---\nObservation: No search results found for this query with the time filter 'none'.\n"
        );
    }
}

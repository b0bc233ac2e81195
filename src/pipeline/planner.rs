//! Planner：让模型生成调查计划，去围栏、解析并立即校验
//!
//! 近期事件（breaking / today 等）需要带时间窗口搜索，这条规则只写在 prompt 里，由模型判断。

use std::sync::Arc;

use crate::core::InvestigationError;
use crate::llm::{LlmClient, Message};
use crate::pipeline::json::parse_model_json;
use crate::pipeline::plan::{MAX_STEPS, MIN_STEPS};
use crate::pipeline::{InvestigationRequest, Plan};
use crate::tools::{plan_schema_json, ToolRegistry, CLOCK_TOOL, OCR_TOOL};

const EXAMPLE_PLAN: &str = r#"[
    {"tool": "get_current_date", "parameters": {}},
    {"tool": "google_search", "parameters": {"query": "earthquake reported off coast of Goa", "time_period": "past_day"}},
    {"tool": "scrape_website", "parameters": {"url": "https://www.reuters.com/world/india/earthquake-reported..."}},
    {"tool": "google_search", "parameters": {"query": "National Center for Seismology Goa earthquake report"}}
]"#;

pub struct Planner {
    llm: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, registry: Arc<ToolRegistry>) -> Self {
        Self { llm, registry }
    }

    /// 用户请求段：有图片时说明图片路径，否则给出原文与来源
    fn request_section(request: &InvestigationRequest) -> String {
        match request.image_path() {
            Some(path) => format!(
                "An image has been provided at path '{}'. The user's text input was '{}'.",
                path.display(),
                request.claim
            ),
            None => format!(
                "Initial Text: \"{}\"\nSource Identifier: \"{}\"",
                request.claim, request.source
            ),
        }
    }

    pub fn build_prompt(&self, request: &InvestigationRequest) -> String {
        format!(
            r#"You are a research planner. Your job is to create a step-by-step plan to investigate a user's query.
The plan should be a list of actions using the available tools.

**Available Tools:**
{catalog}

**Your Task:**
Based on the user's request, create a JSON list of actions (a 'plan') to find the answer.
- **Your FIRST step MUST ALWAYS be `{clock}` to establish temporal context.**
- If the claim contains words suggesting a recent event (e.g., "breaking", "today"), subsequent search steps MUST use a time filter.
- If an image is provided, your second step MUST be `{ocr}`.
- Your plan should have between {min} and {max} steps.
- Only use the tools and parameter names listed above.

**User's Request:**
{request}

**Plan JSON Schema:**
{schema}

**Example Plan for a Breaking News Claim:**
{example}

Now, create the plan for the user's request. Your response MUST be only the JSON list of plan steps.
"#,
            catalog = self.registry.catalog(),
            clock = CLOCK_TOOL,
            ocr = OCR_TOOL,
            min = MIN_STEPS,
            max = MAX_STEPS,
            request = Self::request_section(request),
            schema = plan_schema_json(),
            example = EXAMPLE_PLAN,
        )
    }

    /// 生成并校验计划；请求失败、无法解析或结构不合法都是规划失败，不重试
    pub async fn create_plan(&self, request: &InvestigationRequest) -> Result<Plan, InvestigationError> {
        let prompt = self.build_prompt(request);
        tracing::debug!(prompt_chars = prompt.len(), model = %self.llm.model_name(), "planning prompt built");

        let raw = self
            .llm
            .complete(&[Message::user(prompt)])
            .await
            .map_err(|e| InvestigationError::Planning {
                reason: "model request failed".to_string(),
                source: Some(e),
            })?;

        let plan: Plan = parse_model_json(&raw).map_err(|e| {
            InvestigationError::planning(format!("model response is not a valid plan: {e}"))
        })?;
        plan.validate(&self.registry, request).map_err(|e| {
            InvestigationError::planning(format!("plan violates required structure: {e}"))
        })?;

        tracing::info!(steps = plan.len(), "plan accepted");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient};
    use crate::pipeline::testing::stub_registry;

    fn planner(llm: Arc<MockLlmClient>) -> Planner {
        Planner::new(llm, Arc::new(stub_registry()))
    }

    const GOOD_PLAN: &str = "```json\n[\n  {\"tool\": \"get_current_date\", \"parameters\": {}},\n  {\"tool\": \"google_search\", \"parameters\": {\"query\": \"bridge collapse\", \"time_period\": \"past_day\"}},\n  {\"tool\": \"scrape_website\", \"parameters\": {\"url\": \"https://news.example/bridge\"}}\n]\n```";

    #[test]
    fn test_prompt_without_image() {
        let p = planner(Arc::new(MockLlmClient::new()));
        let request = InvestigationRequest::new("Bridge collapsed today", "@newsdesk", "none");
        let prompt = p.build_prompt(&request);
        assert!(prompt.contains("Initial Text: \"Bridge collapsed today\""));
        assert!(prompt.contains("Source Identifier: \"@newsdesk\""));
        assert!(prompt.contains("- `google_search[query, time_period]`"));
        assert!(prompt.contains("- `get_current_date[]`"));
        assert!(prompt.contains("between 3 and 6 steps"));
    }

    #[test]
    fn test_prompt_with_image() {
        let p = planner(Arc::new(MockLlmClient::new()));
        let request = InvestigationRequest::new("Is this real?", "", "/tmp/shot.png");
        let prompt = p.build_prompt(&request);
        assert!(prompt.contains(
            "An image has been provided at path '/tmp/shot.png'. The user's text input was 'Is this real?'."
        ));
        assert!(!prompt.contains("Initial Text:"));
    }

    #[tokio::test]
    async fn test_fenced_plan_accepted() {
        let llm = Arc::new(MockLlmClient::with_responses([GOOD_PLAN.to_string()]));
        let request = InvestigationRequest::new("Bridge collapsed today", "", "none");
        let plan = planner(llm.clone()).create_plan(&request).await.unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.steps()[0].tool, CLOCK_TOOL);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_prose_is_planning_failure() {
        let llm = Arc::new(MockLlmClient::with_responses([
            "I think you should search the web.".to_string(),
        ]));
        let request = InvestigationRequest::new("x", "", "none");
        let err = planner(llm).create_plan(&request).await.unwrap_err();
        assert!(matches!(err, InvestigationError::Planning { .. }));
    }

    #[tokio::test]
    async fn test_missing_required_parameter_is_planning_failure() {
        let llm = Arc::new(MockLlmClient::with_responses([r#"[
            {"tool": "get_current_date", "parameters": {}},
            {"tool": "google_search", "parameters": {}},
            {"tool": "scrape_website", "parameters": {"url": "https://a.example"}}
        ]"#
        .to_string()]));
        let request = InvestigationRequest::new("x", "", "none");
        let err = planner(llm).create_plan(&request).await.unwrap_err();
        assert!(err.to_string().contains("missing required parameter 'query'"));
    }

    #[tokio::test]
    async fn test_model_error_is_planning_failure_with_source() {
        let llm = Arc::new(MockLlmClient::new());
        llm.push_error(LlmError::Status {
            status: 503,
            body: "overloaded".to_string(),
        });
        let request = InvestigationRequest::new("x", "", "none");
        let err = planner(llm).create_plan(&request).await.unwrap_err();
        assert!(matches!(
            err,
            InvestigationError::Planning { source: Some(_), .. }
        ));
    }
}

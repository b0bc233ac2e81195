//! Synthesizer：把原始主张、来源与完整观察日志交给模型，解析出结构化报告

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::InvestigationError;
use crate::llm::{LlmClient, Message};
use crate::pipeline::json::parse_model_json;
use crate::pipeline::{InvestigationRequest, ObservationLog};

const REPORT_SHAPE: &str = r#"{
  "final_verdict": "A single, conclusive verdict (e.g., 'Confirmed Recent Event', 'Fictional', 'Complex/Opinion-based')",
  "verdict_explanation": "A detailed paragraph explaining your final verdict. You must reference key observations from the research log, including dates or times if found.",
  "claim_analysis_summary": "Summarize the evidence found. If the query was a question, summarize the different viewpoints or facts discovered.",
  "source_analysis_summary": "Summarize your findings about the source's credibility. If no source was provided, state that.",
  "detailed_sources": [
    {
      "title": "Title of a key source you found",
      "url": "URL of that source",
      "relevance_summary": "A one-sentence explanation of why this source was important to your investigation."
    }
  ]
}"#;

/// 报告引用的一条来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedSource {
    pub title: String,
    pub url: String,
    pub relevance_summary: String,
}

/// 最终报告；字段顺序即输出 JSON 的键顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub final_verdict: String,
    pub verdict_explanation: String,
    pub claim_analysis_summary: String,
    pub source_analysis_summary: String,
    pub detailed_sources: Vec<DetailedSource>,
}

impl Report {
    fn validate(&self) -> Result<(), String> {
        if self.final_verdict.trim().is_empty() {
            return Err("final_verdict is empty".to_string());
        }
        Ok(())
    }
}

pub struct Synthesizer {
    llm: Arc<dyn LlmClient>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub fn build_prompt(request: &InvestigationRequest, log: &ObservationLog) -> String {
        format!(
            r#"You are a fact-checking analyst. Based on the user's original query and the full log of research observations,
synthesize a final, detailed report in a valid JSON format.

**User's Original Query:** "{claim}"
**Source Provided:** "{source}"
**Full Research Log:**
{log}

**Required JSON Output Structure:**
{shape}

Your response MUST be only the JSON object.
"#,
            claim = request.claim,
            source = request.source,
            log = log.render(),
            shape = REPORT_SHAPE,
        )
    }

    /// 生成报告；请求失败、无法解析或缺字段都是综合失败，不做补全
    pub async fn synthesize(
        &self,
        request: &InvestigationRequest,
        log: ObservationLog,
    ) -> Result<Report, InvestigationError> {
        let prompt = Self::build_prompt(request, &log);
        tracing::debug!(prompt_chars = prompt.len(), observations = log.len(), "synthesis prompt built");

        let raw = self
            .llm
            .complete(&[Message::user(prompt)])
            .await
            .map_err(|e| InvestigationError::Synthesis {
                reason: "model request failed".to_string(),
                source: Some(e),
            })?;

        let report: Report = parse_model_json(&raw).map_err(|e| {
            InvestigationError::synthesis(format!("model response is not a valid report: {e}"))
        })?;
        report
            .validate()
            .map_err(|e| InvestigationError::synthesis(format!("report is incomplete: {e}")))?;

        tracing::info!(verdict = %report.final_verdict, sources = report.detailed_sources.len(), "report synthesized");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::pipeline::Observation;
    use serde_json::json;

    fn log() -> ObservationLog {
        let mut log = ObservationLog::new();
        log.push(Observation {
            index: 1,
            tool: "get_current_date".to_string(),
            parameters: Default::default(),
            text: "2024-05-01 09:30:00".to_string(),
            ok: true,
        });
        log
    }

    fn report_json() -> String {
        json!({
            "final_verdict": "Confirmed Recent Event",
            "verdict_explanation": "Reported on 2024-05-01 by two outlets.",
            "claim_analysis_summary": "Multiple sources agree.",
            "source_analysis_summary": "No source was provided.",
            "detailed_sources": [
                {"title": "A", "url": "https://a.example", "relevance_summary": "First report."},
                {"title": "B", "url": "https://b.example", "relevance_summary": "Official statement."}
            ]
        })
        .to_string()
    }

    #[test]
    fn test_prompt_embeds_log_and_request() {
        let request = InvestigationRequest::new("Bridge collapsed", "@desk", "none");
        let prompt = Synthesizer::build_prompt(&request, &log());
        assert!(prompt.contains("**User's Original Query:** \"Bridge collapsed\""));
        assert!(prompt.contains("**Source Provided:** \"@desk\""));
        assert!(prompt.contains("--- Step 1: Executing get_current_date with parameters {} ---"));
        assert!(prompt.contains("'Confirmed Recent Event'"));
    }

    #[tokio::test]
    async fn test_report_parsed_in_order() {
        let llm = Arc::new(MockLlmClient::with_responses([format!("```json\n{}\n```", report_json())]));
        let request = InvestigationRequest::new("Bridge collapsed", "", "none");
        let report = Synthesizer::new(llm).synthesize(&request, log()).await.unwrap();
        assert_eq!(report.final_verdict, "Confirmed Recent Event");
        let titles: Vec<&str> = report.detailed_sources.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_missing_field_is_synthesis_failure() {
        let llm = Arc::new(MockLlmClient::with_responses([
            r#"{"final_verdict": "Fictional", "verdict_explanation": "No evidence."}"#.to_string(),
        ]));
        let request = InvestigationRequest::new("x", "", "none");
        let err = Synthesizer::new(llm).synthesize(&request, log()).await.unwrap_err();
        assert!(matches!(err, InvestigationError::Synthesis { .. }));
    }

    #[tokio::test]
    async fn test_empty_verdict_is_synthesis_failure() {
        let mut value: serde_json::Value = serde_json::from_str(&report_json()).unwrap();
        value["final_verdict"] = json!("  ");
        let llm = Arc::new(MockLlmClient::with_responses([value.to_string()]));
        let request = InvestigationRequest::new("x", "", "none");
        let err = Synthesizer::new(llm).synthesize(&request, log()).await.unwrap_err();
        assert!(err.to_string().contains("final_verdict is empty"));
    }
}

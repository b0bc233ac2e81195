//! Web 搜索工具：SerpAPI Google 引擎，可按时间窗口过滤
//!
//! 返回最多 num_results 条 {title, link, snippet, date}，格式化为 JSON 文本供综合阶段引用。
//! 任何失败都转为 `Error during search: <原因>`。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{SearchSection, SecretValue};
use crate::tools::{ParamKind, ParamSpec, Tool, SEARCH_TOOL};

/// 搜索时间窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    PastHour,
    PastDay,
    PastWeek,
}

impl TimeWindow {
    pub const NAMES: &'static [&'static str] = &["past_hour", "past_day", "past_week"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "past_hour" => Some(Self::PastHour),
            "past_day" => Some(Self::PastDay),
            "past_week" => Some(Self::PastWeek),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PastHour => "past_hour",
            Self::PastDay => "past_day",
            Self::PastWeek => "past_week",
        }
    }

    /// Google `tbs` 参数取值
    pub fn tbs(&self) -> &'static str {
        match self {
            Self::PastHour => "qdr:h",
            Self::PastDay => "qdr:d",
            Self::PastWeek => "qdr:w",
        }
    }
}

/// 一条搜索结果（各字段可能缺失）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
    pub date: Option<String>,
}

/// 搜索后端
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str, window: Option<TimeWindow>)
        -> Result<Vec<SearchHit>, String>;
}

/// SerpAPI 客户端
pub struct SerpApiClient {
    client: Client,
    endpoint: String,
    api_key: SecretValue,
    num_results: u32,
}

#[derive(Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<SearchHit>,
    error: Option<String>,
}

impl SerpApiClient {
    pub fn new(cfg: &SearchSection, api_key: SecretValue) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: cfg.endpoint.clone(),
            api_key,
            num_results: cfg.num_results,
        }
    }
}

#[async_trait]
impl SearchClient for SerpApiClient {
    async fn search(
        &self,
        query: &str,
        window: Option<TimeWindow>,
    ) -> Result<Vec<SearchHit>, String> {
        let num = self.num_results.to_string();
        let mut params = vec![
            ("engine", "google"),
            ("q", query),
            ("api_key", self.api_key.expose()),
            ("num", num.as_str()),
        ];
        if let Some(w) = window {
            params.push(("tbs", w.tbs()));
        }

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e.without_url()))?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        let body: SerpApiResponse = resp
            .json()
            .await
            .map_err(|e| format!("invalid response body: {}", e))?;
        if let Some(err) = body.error {
            // SerpAPI 对「无结果」也用 error 字段表达
            if body.organic_results.is_empty() && err.contains("hasn't returned any results") {
                return Ok(Vec::new());
            }
            return Err(err);
        }
        let mut hits = body.organic_results;
        hits.truncate(self.num_results as usize);
        Ok(hits)
    }
}

/// 搜索工具：query 必填，time_period 可选（past_hour / past_day / past_week）
pub struct SearchTool {
    client: Arc<dyn SearchClient>,
}

impl SearchTool {
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL
    }

    fn description(&self) -> &str {
        "Searches the web. `time_period` is optional and can be 'past_hour', 'past_day', or 'past_week'."
    }

    fn parameters(&self) -> &[ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::required("query", ParamKind::String),
            ParamSpec::optional("time_period", ParamKind::String).one_of(TimeWindow::NAMES),
        ];
        PARAMS
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if query.is_empty() {
            return Err("Error during search: missing query".to_string());
        }
        let window = args
            .get("time_period")
            .and_then(|v| v.as_str())
            .and_then(TimeWindow::parse);

        tracing::info!(query = %query, window = ?window, "search tool query");
        let hits = self
            .client
            .search(query, window)
            .await
            .map_err(|e| format!("Error during search: {e}"))?;

        if hits.is_empty() {
            return Ok(format!(
                "No search results found for this query with the time filter '{}'.",
                window.map(|w| w.as_str()).unwrap_or("none")
            ));
        }
        serde_json::to_string_pretty(&hits).map_err(|e| format!("Error during search: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSearch {
        hits: Vec<SearchHit>,
        calls: Mutex<Vec<(String, Option<TimeWindow>)>>,
    }

    #[async_trait]
    impl SearchClient for RecordingSearch {
        async fn search(
            &self,
            query: &str,
            window: Option<TimeWindow>,
        ) -> Result<Vec<SearchHit>, String> {
            self.calls.lock().unwrap().push((query.to_string(), window));
            Ok(self.hits.clone())
        }
    }

    struct BrokenSearch;

    #[async_trait]
    impl SearchClient for BrokenSearch {
        async fn search(&self, _: &str, _: Option<TimeWindow>) -> Result<Vec<SearchHit>, String> {
            Err("HTTP 401 Unauthorized".to_string())
        }
    }

    #[test]
    fn test_time_window_mapping() {
        assert_eq!(TimeWindow::parse("past_day"), Some(TimeWindow::PastDay));
        assert_eq!(TimeWindow::PastHour.tbs(), "qdr:h");
        assert_eq!(TimeWindow::PastWeek.tbs(), "qdr:w");
        assert_eq!(TimeWindow::parse("past_year"), None);
    }

    #[tokio::test]
    async fn test_hits_rendered_as_json() {
        let client = Arc::new(RecordingSearch {
            hits: vec![SearchHit {
                title: Some("Quake hits coast".into()),
                link: Some("https://news.example/quake".into()),
                snippet: Some("A 4.5 magnitude...".into()),
                date: Some("2 hours ago".into()),
            }],
            ..Default::default()
        });
        let tool = SearchTool::new(client.clone());
        let out = tool
            .execute(json!({"query": "quake goa", "time_period": "past_day"}))
            .await
            .unwrap();
        let parsed: Vec<SearchHit> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0].date.as_deref(), Some("2 hours ago"));
        assert_eq!(
            client.calls.lock().unwrap()[0],
            ("quake goa".to_string(), Some(TimeWindow::PastDay))
        );
    }

    #[tokio::test]
    async fn test_empty_results_sentinel() {
        let tool = SearchTool::new(Arc::new(RecordingSearch::default()));
        let out = tool.execute(json!({"query": "nothing"})).await.unwrap();
        assert_eq!(
            out,
            "No search results found for this query with the time filter 'none'."
        );
    }

    #[tokio::test]
    async fn test_failure_is_error_text() {
        let tool = SearchTool::new(Arc::new(BrokenSearch));
        let err = tool.execute(json!({"query": "x"})).await.unwrap_err();
        assert_eq!(err, "Error during search: HTTP 401 Unauthorized");
    }
}

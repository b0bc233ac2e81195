//! 网页抓取工具：GET 页面并抽取所有 `<p>` 段落文本
//!
//! 请求带 User-Agent 与超时；非 200 或传输失败返回 `Failed to retrieve content from the URL.`；
//! 正文超过 max_chars 时截断。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::config::ScrapeSection;
use crate::tools::{ParamKind, ParamSpec, Tool, SCRAPE_TOOL};

const FETCH_FAILED: &str = "Failed to retrieve content from the URL.";
const NO_PARAGRAPHS: &str = "Could not find any paragraph text on the page.";

/// 页面获取：成功返回 HTML 文本，失败返回原因
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, String>;
}

/// 基于 reqwest 的页面获取
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(cfg: &ScrapeSection) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;
        if resp.status() != reqwest::StatusCode::OK {
            return Err(format!("HTTP {}", resp.status()));
        }
        resp.text().await.map_err(|e| format!("Read body: {}", e))
    }
}

/// 抽取全部 `<p>` 的文本，以空格拼接
pub fn extract_paragraph_text(html: &str) -> Result<String, String> {
    let selector = Selector::parse("p").map_err(|e| format!("{e:?}"))?;
    let document = Html::parse_document(html);
    let text = document
        .select(&selector)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ");
    Ok(text)
}

/// 抓取工具：url 必填
pub struct ScrapeTool {
    fetcher: Arc<dyn PageFetcher>,
    max_chars: usize,
}

impl ScrapeTool {
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_chars: usize) -> Self {
        Self { fetcher, max_chars }
    }
}

#[async_trait]
impl Tool for ScrapeTool {
    fn name(&self) -> &str {
        SCRAPE_TOOL
    }

    fn description(&self) -> &str {
        "Scrapes the primary paragraph text of a single URL."
    }

    fn parameters(&self) -> &[ParamSpec] {
        const PARAMS: &[ParamSpec] = &[ParamSpec::required("url", ParamKind::String)];
        PARAMS
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let url = args
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if url.is_empty() {
            return Err("Error during scraping: missing url".to_string());
        }
        tracing::info!(url = %url, "scrape tool fetch");

        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(reason) => {
                tracing::warn!(url = %url, reason = %reason, "page fetch failed");
                return Err(FETCH_FAILED.to_string());
            }
        };

        let content =
            extract_paragraph_text(&html).map_err(|e| format!("Error during scraping: {e}"))?;
        if content.trim().is_empty() {
            return Ok(NO_PARAGRAPHS.to_string());
        }
        Ok(content.chars().take(self.max_chars).collect())
    }
}

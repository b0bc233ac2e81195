//! 单元测试共用的工具替身

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::tools::{
    standard_registry, Clock, PageFetcher, SearchClient, SearchHit, TextDetector, TimeWindow,
    ToolRegistry,
};

pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> String {
        "2024-05-01 09:30:00".to_string()
    }
}

/// 每次返回一条以查询词为标题的结果
pub struct EchoSearch;

#[async_trait]
impl SearchClient for EchoSearch {
    async fn search(
        &self,
        query: &str,
        window: Option<TimeWindow>,
    ) -> Result<Vec<SearchHit>, String> {
        Ok(vec![SearchHit {
            title: Some(format!("Result for {query}")),
            link: Some("https://news.example/story".to_string()),
            snippet: Some("Officials confirmed the report.".to_string()),
            date: window.map(|w| w.as_str().to_string()),
        }])
    }
}

/// 只认识预置 URL 的抓取替身
#[derive(Default)]
pub struct MapFetcher {
    pub pages: HashMap<String, String>,
}

#[async_trait]
impl PageFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Result<String, String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| format!("connection refused: {url}"))
    }
}

pub struct NoTextDetector;

#[async_trait]
impl TextDetector for NoTextDetector {
    async fn detect_text(&self, _image: &[u8]) -> Result<Option<String>, String> {
        Ok(None)
    }
}

pub fn stub_registry() -> ToolRegistry {
    standard_registry(
        Arc::new(FixedClock),
        Arc::new(EchoSearch),
        Arc::new(MapFetcher::default()),
        Arc::new(NoTextDetector),
        4000,
    )
}

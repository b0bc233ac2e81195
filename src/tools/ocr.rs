//! 图片文字识别工具：读取本地图片，调用 Cloud Vision TEXT_DETECTION
//!
//! 识别到文字时返回 `Successfully extracted text: <全文>`，没有文字返回固定提示，
//! 读文件或服务失败返回 `Error during OCR: <原因>`。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::{OcrSection, SecretValue};
use crate::tools::{ParamKind, ParamSpec, Tool, OCR_TOOL};

const NO_TEXT: &str = "No text could be found in the provided image.";

/// 文字检测后端：Some(全文) 或 None（图中无文字）
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect_text(&self, image: &[u8]) -> Result<Option<String>, String>;
}

/// Cloud Vision REST 客户端（images:annotate）
pub struct VisionClient {
    client: Client,
    endpoint: String,
    project: String,
    access_token: SecretValue,
}

impl VisionClient {
    pub fn new(cfg: &OcrSection, project: impl Into<String>, access_token: SecretValue) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: cfg.endpoint.clone(),
            project: project.into(),
            access_token,
        }
    }

    pub fn build_request_body(image: &[u8]) -> Value {
        json!({
            "requests": [{
                "image": { "content": base64_encode(image) },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        })
    }

    /// 取第一条 textAnnotations 的 description（即整图全文）
    pub fn extract_description(body: &Value) -> Result<Option<String>, String> {
        let response = body
            .get("responses")
            .and_then(|r| r.get(0))
            .ok_or_else(|| "response contained no annotation results".to_string())?;
        if let Some(message) = response
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return Err(message.to_string());
        }
        Ok(response
            .get("textAnnotations")
            .and_then(|a| a.get(0))
            .and_then(|a| a.get("description"))
            .and_then(|d| d.as_str())
            .filter(|d| !d.is_empty())
            .map(|d| d.to_string()))
    }
}

#[async_trait]
impl TextDetector for VisionClient {
    async fn detect_text(&self, image: &[u8]) -> Result<Option<String>, String> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.access_token.expose())
            .header("x-goog-user-project", &self.project)
            .json(&Self::build_request_body(image))
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, body));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| format!("invalid response body: {}", e))?;
        Self::extract_description(&body)
    }
}

/// 标准 Base64（带 `=` 填充）
fn base64_encode(input: &[u8]) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);
    for chunk in input.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;
        out.push(CHARS[((triple >> 18) & 0x3F) as usize] as char);
        out.push(CHARS[((triple >> 12) & 0x3F) as usize] as char);
        if chunk.len() > 1 {
            out.push(CHARS[((triple >> 6) & 0x3F) as usize] as char);
        } else {
            out.push('=');
        }
        if chunk.len() > 2 {
            out.push(CHARS[(triple & 0x3F) as usize] as char);
        } else {
            out.push('=');
        }
    }
    out
}

/// OCR 工具：image_path 必填
pub struct OcrTool {
    detector: Arc<dyn TextDetector>,
}

impl OcrTool {
    pub fn new(detector: Arc<dyn TextDetector>) -> Self {
        Self { detector }
    }
}

#[async_trait]
impl Tool for OcrTool {
    fn name(&self) -> &str {
        OCR_TOOL
    }

    fn description(&self) -> &str {
        "Extracts text from a local image file. Use this when an image is provided with the claim."
    }

    fn parameters(&self) -> &[ParamSpec] {
        const PARAMS: &[ParamSpec] = &[ParamSpec::required("image_path", ParamKind::String)];
        PARAMS
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let path = args
            .get("image_path")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if path.is_empty() {
            return Err("Error during OCR: missing image_path".to_string());
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| format!("Error during OCR: cannot read '{}': {}", path, e))?;
        tracing::info!(path = %path, bytes = bytes.len(), "ocr tool detect");

        match self.detector.detect_text(&bytes).await {
            Ok(Some(text)) => Ok(format!("Successfully extracted text: {}", text)),
            Ok(None) => Ok(NO_TEXT.to_string()),
            Err(e) => Err(format!("Error during OCR: {}", e)),
        }
    }
}

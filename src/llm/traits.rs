//! LLM 客户端抽象
//!
//! 所有后端（Vertex AI Gemini / OpenAI 兼容 / Mock）实现 LlmClient：complete（非流式，返回整段文本）。

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::Message;

/// 模型调用失败（传输、鉴权、HTTP 状态、空响应）
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("model returned no text")]
    EmptyResponse,
}

/// LLM 客户端 trait：单轮非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成，返回模型的原始文本
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 模型名（仅用于日志）
    fn model_name(&self) -> &str {
        "unknown"
    }
}

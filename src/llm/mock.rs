//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按顺序返回预置回复，并记录每次收到的 prompt；回复用完后返回 EmptyResponse。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, Message};

/// Mock 客户端：脚本化回复 + prompt 记录
#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::default();
        for r in responses {
            client.push_response(r);
        }
        client
    }

    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Ok(response.into()));
        }
    }

    pub fn push_error(&self, err: LlmError) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Err(err));
        }
    }

    /// 已收到的 prompt（按调用顺序，多条消息以空行拼接）
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt);
        }

        self.responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or(Err(LlmError::EmptyResponse))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let mock = MockLlmClient::with_responses(["first", "second"]);
        assert_eq!(mock.complete(&[Message::user("a")]).await.unwrap(), "first");
        assert_eq!(mock.complete(&[Message::user("b")]).await.unwrap(), "second");
        assert!(matches!(
            mock.complete(&[Message::user("c")]).await,
            Err(LlmError::EmptyResponse)
        ));
        assert_eq!(mock.prompts(), vec!["a", "b", "c"]);
    }
}

//! Vertex AI Gemini 客户端（REST generateContent）
//!
//! 端点：`https://{region}-aiplatform.googleapis.com/v1/projects/{project}/locations/{region}/publishers/google/models/{model}:generateContent`，
//! Bearer token 鉴权。System 消息走 systemInstruction，其余按 user / model 角色放入 contents。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::SecretValue;
use crate::llm::{LlmClient, LlmError, Message, Role};

pub struct VertexClient {
    client: Client,
    endpoint: String,
    model: String,
    access_token: SecretValue,
    project: String,
}

impl VertexClient {
    pub fn new(
        project: &str,
        region: &str,
        model: &str,
        access_token: SecretValue,
        timeout_secs: u64,
    ) -> Self {
        let endpoint = format!(
            "https://{region}-aiplatform.googleapis.com/v1/projects/{project}/locations/{region}/publishers/google/models/{model}:generateContent"
        );
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint,
            model: model.to_string(),
            access_token,
            project: project.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 构造 generateContent 请求体
    pub fn build_request_body(messages: &[Message]) -> Value {
        let mut contents = Vec::new();
        let mut system_parts = Vec::new();

        for m in messages {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "model",
                Role::System => {
                    system_parts.push(json!({ "text": m.content }));
                    continue;
                }
            };
            contents.push(json!({
                "role": role,
                "parts": [{ "text": m.content }],
            }));
        }

        let mut body = json!({ "contents": contents });
        if !system_parts.is_empty() {
            body["systemInstruction"] = json!({ "parts": system_parts });
        }
        body
    }

    /// 拼接 candidates[0].content.parts 中的全部 text
    pub fn extract_text(response: &Value) -> Result<String, LlmError> {
        let parts = response["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or(LlmError::EmptyResponse)?;
        let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmClient for VertexClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let body = Self::build_request_body(messages);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.access_token.expose())
            .header("x-goog-user-project", &self.project)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        if let Some(usage) = value.get("usageMetadata") {
            tracing::debug!(
                prompt_tokens = usage["promptTokenCount"].as_u64().unwrap_or(0),
                candidate_tokens = usage["candidatesTokenCount"].as_u64().unwrap_or(0),
                "vertex usage"
            );
        }

        Self::extract_text(&value)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_layout() {
        let client = VertexClient::new(
            "my-proj",
            "us-central1",
            "gemini-2.5-flash",
            SecretValue::new("t"),
            5,
        );
        assert_eq!(
            client.endpoint(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/my-proj/locations/us-central1/publishers/google/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_system_message_goes_to_instruction() {
        let body = VertexClient::build_request_body(&[
            Message::system("be terse"),
            Message::user("hello"),
        ]);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be terse");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["role"], "user");
    }

    #[test]
    fn test_assistant_turn_uses_model_role() {
        let body = VertexClient::build_request_body(&[
            Message::user("claim?"),
            Message::assistant("[]"),
        ]);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["text"], "[]");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let resp = json!({
            "candidates": [{ "content": { "parts": [{ "text": "[{\"tool\"" }, { "text": ": 1}]" }] } }]
        });
        assert_eq!(VertexClient::extract_text(&resp).unwrap(), "[{\"tool\": 1}]");
    }

    #[test]
    fn test_extract_text_empty() {
        let resp = json!({ "candidates": [] });
        assert!(matches!(
            VertexClient::extract_text(&resp),
            Err(LlmError::EmptyResponse)
        ));
    }
}

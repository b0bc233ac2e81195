//! LLM 层：客户端抽象与实现（Vertex AI Gemini / OpenAI 兼容 / Mock）

pub mod message;
pub mod mock;
pub mod openai;
pub mod traits;
pub mod vertex;

pub use message::{Message, Role};
pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use traits::{LlmClient, LlmError};
pub use vertex::VertexClient;

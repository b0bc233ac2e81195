//! Claimcheck - 事实核查智能体
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）与启动凭据
//! - **core**: 错误分类、阶段状态机、调查编排
//! - **llm**: 模型客户端抽象与实现（Vertex AI Gemini / OpenAI 兼容 / Mock）
//! - **observability**: tracing 日志初始化
//! - **pipeline**: 计划数据模型、Planner、计划执行、Synthesizer
//! - **tools**: 工具注册表、执行器与四个标准工具（时钟、搜索、抓取、OCR）

pub mod config;
pub mod core;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod tools;

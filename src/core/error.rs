//! 调查错误类型与错误输出载荷
//!
//! 工具调度失败不在此列：它们在调度边界内被转为观察文本（见 tools::executor）。
//! 这里只有会终止整个流程的三类失败：初始化、规划、综合。

use serde::Serialize;
use thiserror::Error;

use crate::core::InvestigationPhase;
use crate::llm::LlmError;

/// 终止调查流程的错误（初始化 / 规划 / 综合）
#[derive(Error, Debug)]
pub enum InvestigationError {
    /// 缺少凭据、配置或命令行参数；在任何阶段开始前报告
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// 模型请求失败，或计划无法解析 / 不满足结构约束
    #[error("planning failed: {reason}")]
    Planning {
        reason: String,
        #[source]
        source: Option<LlmError>,
    },

    /// 模型请求失败，或报告无法解析 / 缺少字段
    #[error("synthesis failed: {reason}")]
    Synthesis {
        reason: String,
        #[source]
        source: Option<LlmError>,
    },
}

impl InvestigationError {
    pub fn planning(reason: impl Into<String>) -> Self {
        Self::Planning {
            reason: reason.into(),
            source: None,
        }
    }

    pub fn synthesis(reason: impl Into<String>) -> Self {
        Self::Synthesis {
            reason: reason.into(),
            source: None,
        }
    }

    /// 出错时所处的阶段
    pub fn phase(&self) -> InvestigationPhase {
        match self {
            Self::Initialization(_) => InvestigationPhase::Start,
            Self::Planning { .. } => InvestigationPhase::Planning,
            Self::Synthesis { .. } => InvestigationPhase::Synthesizing,
        }
    }

    /// 错误载荷中的 `error` 标题
    pub fn title(&self) -> &'static str {
        match self {
            Self::Initialization(_) => "Initialization Failed",
            Self::Planning { .. } => "Planning Failed",
            Self::Synthesis { .. } => "Synthesis Failed",
        }
    }
}

/// 失败时写到 stderr 的唯一 JSON 文档
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    pub details: String,
    pub phase: String,
    /// 错误链（最外层在前）
    pub traceback: Vec<String>,
}

impl ErrorPayload {
    pub fn from_investigation(err: &InvestigationError) -> Self {
        Self {
            error: err.title().to_string(),
            details: err.to_string(),
            phase: err.phase().as_str().to_string(),
            traceback: source_chain(err),
        }
    }

    /// 进程边界上的非分类错误（运行时创建失败等）
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        Self {
            error: "An exception occurred during agent execution.".to_string(),
            details: err.to_string(),
            phase: InvestigationPhase::Failed.as_str().to_string(),
            traceback: err.chain().map(|e| e.to_string()).collect(),
        }
    }
}

fn source_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut current = err.source();
    while let Some(cause) = current {
        chain.push(cause.to_string());
        current = cause.source();
    }
    chain
}

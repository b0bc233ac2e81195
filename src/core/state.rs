//! 调查状态机：Start -> Planning -> Executing -> Synthesizing -> Done
//!
//! 任一阶段失败直接进入 Failed；Done 与 Failed 为终态。不跳过、不重试。

use serde::Serialize;

/// 调查阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationPhase {
    Start,
    Planning,
    Executing,
    Synthesizing,
    Done,
    Failed,
}

impl InvestigationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Planning => "planning",
            Self::Executing => "executing",
            Self::Synthesizing => "synthesizing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// 成功路径上的下一阶段；终态返回 None
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::Planning),
            Self::Planning => Some(Self::Executing),
            Self::Executing => Some(Self::Synthesizing),
            Self::Synthesizing => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// 是否为合法迁移：沿成功路径前进一步，或从非终态进入 Failed
    pub fn can_transition_to(&self, to: Self) -> bool {
        if to == Self::Failed {
            return !self.is_terminal();
        }
        self.next() == Some(to)
    }
}

impl std::fmt::Display for InvestigationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

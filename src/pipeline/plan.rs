//! 调查请求与计划数据模型
//!
//! Plan 由模型生成，解析后立即按 ToolRegistry 的参数声明校验；不合法即规划失败，不会进入执行阶段。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::{ToolRegistry, CLOCK_TOOL, OCR_TOOL};

pub const MIN_STEPS: usize = 3;
pub const MAX_STEPS: usize = 6;

/// 一次调查的输入，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestigationRequest {
    pub claim: String,
    /// 来源标识，可为空
    pub source: String,
    pub image: Option<PathBuf>,
}

impl InvestigationRequest {
    /// `image_arg` 为 `none` / `null`（不区分大小写）或空串时视为未提供图片
    pub fn new(claim: impl Into<String>, source: impl Into<String>, image_arg: &str) -> Self {
        let trimmed = image_arg.trim();
        let image = if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("null")
        {
            None
        } else {
            Some(PathBuf::from(trimmed))
        };
        Self {
            claim: claim.into(),
            source: source.into(),
            image,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.image.as_deref()
    }
}

/// 计划中的一步：工具名 + 参数表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanStep {
    /// 工具名，必须是已注册工具之一
    pub tool: String,
    /// 参数名到值的映射；无参数工具可省略或给 {}
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

impl PlanStep {
    pub fn new(tool: impl Into<String>, parameters: Value) -> Self {
        let parameters = match parameters {
            Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        Self {
            tool: tool.into(),
            parameters,
        }
    }

    /// 参数表转为 JSON 对象，作为工具 execute 的入参
    pub fn arguments(&self) -> Value {
        Value::Object(
            self.parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// 有序步骤序列（JSON 形态即步骤数组）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 结构校验：步数在 [3, 6]；第一步是时钟；有图片时第二步是 OCR；每步通过工具参数声明校验
    pub fn validate(&self, registry: &ToolRegistry, request: &InvestigationRequest) -> Result<(), String> {
        let n = self.steps.len();
        if !(MIN_STEPS..=MAX_STEPS).contains(&n) {
            return Err(format!(
                "plan must have between {MIN_STEPS} and {MAX_STEPS} steps, got {n}"
            ));
        }
        if self.steps[0].tool != CLOCK_TOOL {
            return Err(format!(
                "first step must be '{CLOCK_TOOL}', got '{}'",
                self.steps[0].tool
            ));
        }
        if request.has_image() && self.steps[1].tool != OCR_TOOL {
            return Err(format!(
                "an image was provided, so the second step must be '{OCR_TOOL}', got '{}'",
                self.steps[1].tool
            ));
        }
        for (i, step) in self.steps.iter().enumerate() {
            registry
                .validate_call(&step.tool, &step.parameters)
                .map_err(|e| format!("step {}: {}", i + 1, e))?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a PlanStep;
    type IntoIter = std::slice::Iter<'a, PlanStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

//! 计划 JSON Schema 生成
//!
//! 用 schemars 从 PlanStep 生成「合法计划」的 Schema，拼入规划 prompt，减少模型输出格式错误。

use schemars::schema_for;

use crate::pipeline::PlanStep;

/// 返回计划（PlanStep 数组）的 JSON Schema 字符串
pub fn plan_schema_json() -> String {
    let schema = schema_for!(Vec<PlanStep>);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

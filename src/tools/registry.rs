//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / parameters / execute），由 ToolRegistry 按名注册与查找，
//! ToolExecutor 在调用时加超时并把任何失败转为观察文本。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// 参数值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Boolean,
}

impl ParamKind {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
        }
    }
}

/// 单个参数的声明：名称、类型、是否必填、可选的枚举取值
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    /// 非空时取值必须落在其中
    pub allowed: &'static [&'static str],
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            allowed: &[],
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            allowed: &[],
        }
    }

    pub const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = allowed;
        self
    }

    fn check(&self, tool: &str, value: &Value) -> Result<(), String> {
        if !self.kind.matches(value) {
            return Err(format!(
                "parameter '{}' of tool '{}' must be a {}",
                self.name,
                tool,
                self.kind.as_str()
            ));
        }
        if !self.allowed.is_empty() {
            let ok = value
                .as_str()
                .map(|s| self.allowed.contains(&s))
                .unwrap_or(false);
            if !ok {
                return Err(format!(
                    "parameter '{}' of tool '{}' must be one of {:?}, got {}",
                    self.name, tool, self.allowed, value
                ));
            }
        }
        Ok(())
    }
}

/// 工具 trait：名称、描述（供 LLM 理解）、参数声明、异步执行（args 为 JSON 对象）
///
/// `execute` 的 Err 分支就是给 LLM 看的错误观察文本，如 `Error during search: ...`。
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（用于计划中的 "tool" 字段）
    fn name(&self) -> &str;

    /// 工具描述（供规划模型理解功能）
    fn description(&self) -> &str;

    /// 参数声明，默认无参数
    fn parameters(&self) -> &[ParamSpec] {
        &[]
    }

    /// 执行工具
    async fn execute(&self, args: Value) -> Result<String, String>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>，并保留注册顺序（prompt 中的工具列表按此顺序）
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), Arc::new(tool)).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<String, String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| format!("Unknown tool: {name}"))?;
        tool.execute(args).await
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// 按工具声明校验一次调用：未知工具、缺少必填参数、类型不符、枚举越界、未声明参数都拒绝。
    /// 值为 null 的可选参数视为未提供。
    pub fn validate_call(&self, name: &str, params: &BTreeMap<String, Value>) -> Result<(), String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| format!("unknown tool '{name}'"))?;
        let specs = tool.parameters();

        for key in params.keys() {
            if !specs.iter().any(|s| s.name == key) {
                return Err(format!("tool '{name}' does not accept parameter '{key}'"));
            }
        }

        for spec in specs {
            match params.get(spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(format!(
                        "tool '{name}' is missing required parameter '{}'",
                        spec.name
                    ));
                }
                None | Some(Value::Null) => {}
                Some(value) => spec.check(name, value)?,
            }
        }
        Ok(())
    }

    /// 返回 prompt 中的 Available Tools 段落：`- \`name[a, b]\`: description`
    pub fn catalog(&self) -> String {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                let params = tool
                    .parameters()
                    .iter()
                    .map(|p| p.name)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("- `{}[{}]`: {}", tool.name(), params, tool.description())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

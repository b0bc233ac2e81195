//! 模型输出解析：去掉 Markdown 代码围栏后按 JSON 反序列化

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;

fn fence_regex() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)\s*```").ok())
        .as_ref()
}

/// 若回复包含完整 ``` 围栏（可带 json 标签），取第一个围栏内的内容；
/// 否则分别去掉开头的 ```<lang> 行与结尾的 ```（围栏未闭合时）
pub fn strip_code_fences(raw: &str) -> &str {
    if let Some(inner) = fence_regex()
        .and_then(|re| re.captures(raw))
        .and_then(|c| c.get(1))
    {
        return inner.as_str();
    }

    let mut body = raw.trim();
    if body.starts_with("```") {
        body = body.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    }
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// 去围栏并解析为 T；失败信息附带回复开头，便于排查
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let body = strip_code_fences(raw);
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(120).collect();
        format!("{e} (response began with: {preview:?})")
    })
}

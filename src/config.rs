//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CLAIMCHECK__*` 覆盖（双下划线表示嵌套，如 `CLAIMCHECK__LLM__MODEL=gemini-2.5-pro`）。
//! 密钥不进配置文件：[`Credentials`] 只从进程环境读取，缺失即初始化失败。

use std::path::PathBuf;

use serde::Deserialize;
use tokio::process::Command;

use crate::core::InvestigationError;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// [llm] 段：后端选择、模型、区域与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：vertex / openai
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Vertex AI 区域
    #[serde(default = "default_region")]
    pub region: String,
    /// 仅 openai 后端使用（OpenAI 兼容端点）
    pub base_url: Option<String>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            region: default_region(),
            base_url: None,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "vertex".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_region() -> String {
    "us-central1".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

/// [tools] 段：单次工具调用的外层超时，以及各工具的客户端参数
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒），超时转为错误观察
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub scrape: ScrapeSection,
    #[serde(default)]
    pub ocr: OcrSection,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
            search: SearchSection::default(),
            scrape: ScrapeSection::default(),
            ocr: OcrSection::default(),
        }
    }
}

fn default_tool_timeout_secs() -> u64 {
    30
}

/// [tools.search] 段：SerpAPI 端点、返回条数、超时
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSection {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_num_results")]
    pub num_results: u32,
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            num_results: default_num_results(),
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://serpapi.com/search.json".to_string()
}

fn default_num_results() -> u32 {
    7
}

fn default_search_timeout_secs() -> u64 {
    15
}

/// [tools.scrape] 段：抓取超时、正文最大字符数、User-Agent
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeSection {
    #[serde(default = "default_scrape_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScrapeSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_scrape_timeout_secs(),
            max_chars: default_max_chars(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_scrape_timeout_secs() -> u64 {
    10
}

fn default_max_chars() -> usize {
    4000
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

/// [tools.ocr] 段：Cloud Vision 端点与超时
#[derive(Debug, Clone, Deserialize)]
pub struct OcrSection {
    #[serde(default = "default_ocr_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OcrSection {
    fn default() -> Self {
        Self {
            endpoint: default_ocr_endpoint(),
            timeout_secs: default_ocr_timeout_secs(),
        }
    }
}

fn default_ocr_endpoint() -> String {
    "https://vision.googleapis.com/v1/images:annotate".to_string()
}

fn default_ocr_timeout_secs() -> u64 {
    20
}

/// [logging] 段：日志级别与可选日志文件（stdout/stderr 留给 JSON 结果）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

/// 从 config 目录加载配置，环境变量 CLAIMCHECK__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path，则追加该文件（可覆盖前面的键）；文件不存在时报错
/// 3. 最后叠加环境变量 CLAIMCHECK__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    // 显式传入的文件必须存在
    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CLAIMCHECK")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

pub const SERPAPI_KEY_ENV: &str = "SERPAPI_API_KEY";
pub const GCLOUD_PROJECT_ENV: &str = "GCLOUD_PROJECT";
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
const ADC_ENVS: [&str; 2] = [
    "GOOGLE_APPLICATION_CREDENTIALS",
    "GCLOUD_AUTH_APPLICATION_DEFAULT_CLIENT_ID",
];

/// 敏感值包装：Debug 输出不泄露内容
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "***redacted***")
    }
}

/// Google 凭据上下文：显式 access token，或交给 gcloud 从 ADC 换取
#[derive(Debug, Clone)]
pub enum GoogleCredential {
    AccessToken(SecretValue),
    ApplicationDefault,
}

impl GoogleCredential {
    /// 取得 Bearer token；ADC 模式下调用 `gcloud auth application-default print-access-token`
    pub async fn access_token(&self) -> Result<SecretValue, InvestigationError> {
        match self {
            GoogleCredential::AccessToken(token) => Ok(token.clone()),
            GoogleCredential::ApplicationDefault => {
                let output = Command::new("gcloud")
                    .args(["auth", "application-default", "print-access-token"])
                    .output()
                    .await
                    .map_err(|e| {
                        InvestigationError::Initialization(format!(
                            "Google Cloud Authentication Error: failed to run gcloud: {e}"
                        ))
                    })?;
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(InvestigationError::Initialization(format!(
                        "Google Cloud Authentication Error: gcloud exited with {}: {}",
                        output.status,
                        stderr.trim()
                    )));
                }
                let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if token.is_empty() {
                    return Err(InvestigationError::Initialization(
                        "Google Cloud Authentication Error: gcloud returned an empty access token"
                            .to_string(),
                    ));
                }
                Ok(SecretValue(token))
            }
        }
    }
}

/// 启动所需的全部凭据与项目标识
#[derive(Debug, Clone)]
pub struct Credentials {
    pub serpapi_api_key: SecretValue,
    pub gcloud_project: String,
    pub google: GoogleCredential,
    pub openai_api_key: Option<SecretValue>,
}

impl Credentials {
    pub fn from_env(llm: &LlmSection) -> Result<Self, InvestigationError> {
        Self::from_lookup(llm, |key| std::env::var(key).ok())
    }

    /// 通过 lookup 解析凭据（测试中以 HashMap 代替进程环境）
    pub fn from_lookup<F>(llm: &LlmSection, lookup: F) -> Result<Self, InvestigationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let google = match non_empty(ACCESS_TOKEN_ENV) {
            Some(token) => GoogleCredential::AccessToken(SecretValue(token)),
            None if ADC_ENVS.iter().any(|key| non_empty(key).is_some()) => {
                GoogleCredential::ApplicationDefault
            }
            None => {
                return Err(InvestigationError::Initialization(
                    "Google Cloud Authentication Error: Credentials not found. Please run 'gcloud auth application-default login' in your terminal.".to_string(),
                ))
            }
        };

        let mut missing = Vec::new();
        let serpapi_api_key = non_empty(SERPAPI_KEY_ENV);
        if serpapi_api_key.is_none() {
            missing.push(SERPAPI_KEY_ENV);
        }
        let gcloud_project = non_empty(GCLOUD_PROJECT_ENV);
        if gcloud_project.is_none() {
            missing.push(GCLOUD_PROJECT_ENV);
        }
        let openai_api_key = non_empty(OPENAI_KEY_ENV).map(SecretValue);
        if llm.provider.eq_ignore_ascii_case("openai") && openai_api_key.is_none() {
            missing.push(OPENAI_KEY_ENV);
        }

        match (serpapi_api_key, gcloud_project) {
            (Some(key), Some(project)) if missing.is_empty() => Ok(Self {
                serpapi_api_key: SecretValue(key),
                gcloud_project: project,
                google,
                openai_api_key,
            }),
            _ => Err(InvestigationError::Initialization(format!(
                "Missing environment variables: {} must be set",
                missing.join(", ")
            ))),
        }
    }
}

//! 调查编排器：驱动 Planning -> Executing -> Synthesizing 三阶段
//!
//! 负责：按配置与凭据创建 LLM 与四个标准工具，串行执行三阶段，
//! 并通过 watch 通道发布当前阶段；任一阶段失败立即进入 Failed。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::Instrument;

use crate::config::{AppConfig, Credentials, SecretValue};
use crate::core::{InvestigationError, InvestigationPhase};
use crate::llm::{LlmClient, OpenAiClient, VertexClient};
use crate::pipeline::{InvestigationRequest, PlanExecutor, Planner, Report, Synthesizer};
use crate::tools::{
    standard_registry, HttpPageFetcher, SerpApiClient, SystemClock, ToolExecutor, ToolRegistry,
    VisionClient,
};

/// 根据 [llm].provider 选择模型后端（vertex / openai）
pub fn create_llm_from_config(
    cfg: &AppConfig,
    creds: &Credentials,
    google_token: &SecretValue,
) -> Result<Arc<dyn LlmClient>, InvestigationError> {
    match cfg.llm.provider.to_lowercase().as_str() {
        "vertex" => {
            tracing::info!(model = %cfg.llm.model, region = %cfg.llm.region, "using Vertex AI model");
            Ok(Arc::new(VertexClient::new(
                &creds.gcloud_project,
                &cfg.llm.region,
                &cfg.llm.model,
                google_token.clone(),
                cfg.llm.timeout_secs,
            )))
        }
        "openai" => {
            let key = creds.openai_api_key.as_ref().ok_or_else(|| {
                InvestigationError::Initialization(
                    "OPENAI_API_KEY must be set when provider is 'openai'".to_string(),
                )
            })?;
            tracing::info!(model = %cfg.llm.model, "using OpenAI-compatible model");
            Ok(Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                &cfg.llm.model,
                key.expose(),
            )))
        }
        other => Err(InvestigationError::Initialization(format!(
            "unknown llm provider '{other}' (expected 'vertex' or 'openai')"
        ))),
    }
}

/// 一次调查的执行体；每个进程只处理一个请求
pub struct Investigator {
    planner: Planner,
    executor: PlanExecutor,
    synthesizer: Synthesizer,
    phase_tx: watch::Sender<InvestigationPhase>,
}

impl Investigator {
    pub fn new(llm: Arc<dyn LlmClient>, registry: Arc<ToolRegistry>, tool_timeout_secs: u64) -> Self {
        let (phase_tx, _) = watch::channel(InvestigationPhase::Start);
        Self {
            planner: Planner::new(llm.clone(), registry.clone()),
            executor: PlanExecutor::new(ToolExecutor::new(registry, tool_timeout_secs)),
            synthesizer: Synthesizer::new(llm),
            phase_tx,
        }
    }

    /// 订阅阶段变化
    pub fn subscribe(&self) -> watch::Receiver<InvestigationPhase> {
        self.phase_tx.subscribe()
    }

    fn transition(&self, to: InvestigationPhase) {
        let from = self.phase_tx.send_replace(to);
        if !from.can_transition_to(to) {
            tracing::warn!(%from, %to, "unexpected phase transition");
        }
        tracing::info!(%from, %to, "phase");
    }

    /// 运行完整流水线，成功返回报告
    pub async fn run(self, request: InvestigationRequest) -> Result<Report, InvestigationError> {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("investigation", %run_id);
        async move {
            let result = self.run_phases(&request).await;
            match &result {
                Ok(_) => self.transition(InvestigationPhase::Done),
                Err(e) => {
                    tracing::error!(phase = %e.phase(), error = %e, "investigation failed");
                    self.transition(InvestigationPhase::Failed);
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_phases(&self, request: &InvestigationRequest) -> Result<Report, InvestigationError> {
        self.transition(InvestigationPhase::Planning);
        let plan = self.planner.create_plan(request).await?;

        self.transition(InvestigationPhase::Executing);
        let log = self.executor.execute_plan(&plan).await;

        self.transition(InvestigationPhase::Synthesizing);
        self.synthesizer.synthesize(request, log).await
    }
}

/// 按配置与凭据装配生产环境的 Investigator（含 Google access token 获取）
pub async fn build_investigator(
    cfg: &AppConfig,
    creds: &Credentials,
) -> Result<Investigator, InvestigationError> {
    let google_token = creds.google.access_token().await?;
    let llm = create_llm_from_config(cfg, creds, &google_token)?;

    let tools = &cfg.tools;
    let registry = standard_registry(
        Arc::new(SystemClock),
        Arc::new(SerpApiClient::new(&tools.search, creds.serpapi_api_key.clone())),
        Arc::new(HttpPageFetcher::new(&tools.scrape)),
        Arc::new(VisionClient::new(
            &tools.ocr,
            creds.gcloud_project.clone(),
            google_token,
        )),
        tools.scrape.max_chars,
    );
    tracing::info!(tools = ?registry.tool_names(), "tool registry ready");

    Ok(Investigator::new(llm, Arc::new(registry), tools.tool_timeout_secs))
}

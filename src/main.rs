//! Claimcheck - 事实核查智能体
//!
//! 入口：解析参数、加载配置与凭据、运行一次调查。
//! 成功时报告 JSON 写 stdout（退出码 0），失败时错误 JSON 写 stderr（退出码 1），二者只出其一。

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;

use claimcheck::config::{load_config, Credentials};
use claimcheck::core::{build_investigator, ErrorPayload, InvestigationError};
use claimcheck::observability;
use claimcheck::pipeline::{InvestigationRequest, Report};

#[derive(Parser, Debug)]
#[command(name = "claimcheck", version, about = "Investigate a factual claim and print a JSON verdict report")]
struct Cli {
    /// 待核查的主张文本（允许以 `-` 开头）
    #[arg(allow_hyphen_values = true)]
    claim: String,
    /// 来源标识（可为空串）
    #[arg(allow_hyphen_values = true)]
    source: String,
    /// 图片路径；无图片时传 none / null
    #[arg(allow_hyphen_values = true)]
    image: String,
    /// 额外的配置文件，覆盖 config/default.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

async fn run(cli: Cli) -> Result<Report, InvestigationError> {
    let cfg = load_config(cli.config.clone()).map_err(|e| {
        InvestigationError::Initialization(format!("failed to load configuration: {e}"))
    })?;
    observability::init(&cfg.logging).map_err(|e| {
        InvestigationError::Initialization(format!("failed to open log file: {e}"))
    })?;

    let creds = Credentials::from_env(&cfg.llm)?;
    let investigator = build_investigator(&cfg, &creds).await?;

    let request = InvestigationRequest::new(cli.claim, cli.source, &cli.image);
    tracing::info!(has_image = request.has_image(), "investigation request accepted");
    investigator.run(request).await
}

fn emit_error(payload: &ErrorPayload) -> ExitCode {
    let json = serde_json::to_string(payload).unwrap_or_else(|_| {
        format!(r#"{{"error":"{}","details":"unserializable error"}}"#, payload.error)
    });
    eprintln!("{json}");
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let rendered = e.to_string();
            let first = rendered.lines().next().unwrap_or_default();
            let err = InvestigationError::Initialization(format!(
                "Invalid arguments. Expected: claim, source_identifier, image_path ({})",
                first.trim_start_matches("error: ")
            ));
            return emit_error(&ErrorPayload::from_investigation(&err));
        }
    };

    match run(cli).await {
        Ok(report) => match serde_json::to_string_pretty(&report).context("failed to serialize report") {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => emit_error(&ErrorPayload::from_anyhow(&e)),
        },
        Err(e) => emit_error(&ErrorPayload::from_investigation(&e)),
    }
}

//! 核心编排层：错误分类、阶段状态机、调查主流程

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::{ErrorPayload, InvestigationError};
pub use orchestrator::{build_investigator, create_llm_from_config, Investigator};
pub use state::InvestigationPhase;

//! 调查流水线：Plan → Execute → Synthesize

pub mod executor;
pub mod json;
pub mod plan;
pub mod planner;
pub mod synthesizer;

#[cfg(test)]
pub(crate) mod testing;

pub use executor::{Observation, ObservationLog, PlanExecutor};
pub use json::{parse_model_json, strip_code_fences};
pub use plan::{InvestigationRequest, Plan, PlanStep};
pub use planner::Planner;
pub use synthesizer::{DetailedSource, Report, Synthesizer};

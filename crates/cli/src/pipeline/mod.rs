//! Pipeline orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{load_session, Pipeline, PipelineConfig};
pub use stats::PipelineStats;

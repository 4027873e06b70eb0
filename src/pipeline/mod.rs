pub mod config;
pub mod orchestrator;
pub mod report;

pub use config::PipelineOptions;
pub use orchestrator::PipelineOrchestrator;
pub use report::{Plan, RunReport, RunStatus};

pub mod commands;
pub mod output;

pub use commands::{BuildArgs, CliArgs, Commands, PlanArgs};
pub use output::{OutputFormat, OutputFormatter};

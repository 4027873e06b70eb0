use partcy::build::{ArtifactSuffix, CythonBuild};
use partcy::cli::commands::{BuildArgs, CliArgs, Commands, PlanArgs};
use partcy::cli::output::{OutputFormat, OutputFormatter};
use partcy::pipeline::{PipelineOptions, PipelineOrchestrator};
use partcy::progress::LoggingHandler;
use partcy::util::logging::{self, parse_level, LoggingConfig};
use partcy::{PartcyConfig, NAME, VERSION};

use clap::Parser;
use std::path::Path;
use std::process;
use tracing::{debug, error, info, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Build(build_args) => handle_build(build_args),
        Commands::Plan(plan_args) => handle_plan(plan_args),
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let config = if let Some(level_str) = &args.log_level {
        LoggingConfig::with_level(parse_level(level_str))
    } else if args.verbose {
        LoggingConfig::verbose()
    } else if args.quiet {
        LoggingConfig::with_level(Level::ERROR)
    } else {
        logging::config_from_env()
    };
    logging::init_logging(config);
}

/// Loads the config file (if any) and environment overrides, then validates.
fn load_config(path: Option<&Path>) -> Option<PartcyConfig> {
    match PartcyConfig::load(path) {
        Ok(config) => Some(config),
        Err(e) => {
            error!("Configuration error: {}", e);
            None
        }
    }
}

fn validate_config(config: &PartcyConfig) -> bool {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your configuration file, environment variables and command-line arguments.");
        return false;
    }
    debug!("{}", config);
    true
}

fn resolve_suffix(config: &PartcyConfig, build: &CythonBuild) -> ArtifactSuffix {
    match &config.ext_suffix {
        Some(suffix) => {
            debug!(suffix = %suffix, "Using configured extension suffix");
            ArtifactSuffix::new(suffix.clone())
        }
        None => build.resolve_ext_suffix(),
    }
}

fn handle_build(args: &BuildArgs) -> i32 {
    let Some(mut config) = load_config(args.config.as_deref()) else {
        return 1;
    };
    config.compile_all |= args.compile_all;
    config.clean |= args.clean;
    if let Some(python) = &args.python {
        config.python = python.clone();
    }
    if !validate_config(&config) {
        return 1;
    }

    let build = CythonBuild::new(config.python.clone());
    let suffix = resolve_suffix(&config, &build);
    let options = match PipelineOptions::from_config(&config, suffix) {
        Ok(o) => o,
        Err(e) => {
            error!("Configuration error: {}", e);
            return 1;
        }
    };

    let handler = LoggingHandler;
    let orchestrator = PipelineOrchestrator::new(options, &build).with_progress(&handler);

    let report = match orchestrator.execute(&args.source, &args.destination) {
        Ok(r) => r,
        Err(e) => {
            error!("Build failed: {}", e);
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    info!(
        status = ?report.status,
        written = report.written.len(),
        "Finished"
    );

    print_output(args.format.into(), |f| f.format_report(&report))
}

fn handle_plan(args: &PlanArgs) -> i32 {
    let Some(mut config) = load_config(args.config.as_deref()) else {
        return 1;
    };
    config.compile_all |= args.compile_all;
    if !validate_config(&config) {
        return 1;
    }

    let build = CythonBuild::new(config.python.clone());
    let suffix = resolve_suffix(&config, &build);
    let options = match PipelineOptions::from_config(&config, suffix) {
        Ok(o) => o,
        Err(e) => {
            error!("Configuration error: {}", e);
            return 1;
        }
    };

    let handler = LoggingHandler;
    let plan = match PipelineOrchestrator::new(options, &build)
        .with_progress(&handler)
        .plan(&args.source)
    {
        Ok(p) => p,
        Err(e) => {
            error!("Planning failed: {}", e);
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    print_output(args.format.into(), |f| f.format_plan(&plan))
}

fn print_output(
    format: OutputFormat,
    render: impl FnOnce(&OutputFormatter) -> anyhow::Result<String>,
) -> i32 {
    let formatter = OutputFormatter::new(format);
    match render(&formatter) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            error!("Failed to format output: {}", e);
            1
        }
    }
}

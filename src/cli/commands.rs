use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Compile selected modules of a Python package with Cython and assemble a
/// distributable tree
#[derive(Parser, Debug)]
#[command(
    name = "partcy",
    about = "Compile selected modules of a Python package with Cython",
    version,
    author,
    long_about = "partcy walks a Python package, compiles the modules that opt in \
                  (or all of them) to native extension modules with Cython, and writes \
                  a destination tree where compiled modules are replaced by their \
                  native artifacts and everything else is copied as-is."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        value_name = "LEVEL",
        help = "Set logging level"
    )]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Compile a package and assemble the destination tree",
        long_about = "Classifies every file in the package, compiles the selected modules \
                      with Cython, and writes the destination tree.\n\n\
                      Examples:\n  \
                      partcy build ./mypkg ./dist\n  \
                      partcy build ./mypkg ./dist --compile-all --clean\n  \
                      partcy build ./mypkg ./dist --config partcy.toml --format json"
    )]
    Build(BuildArgs),

    #[command(
        about = "Show how a package would be classified and compiled",
        long_about = "Classifies every file in the package and prints the manifest that \
                      would be compiled. Nothing is written.\n\n\
                      Examples:\n  \
                      partcy plan ./mypkg\n  \
                      partcy plan ./mypkg --compile-all --format yaml"
    )]
    Plan(PlanArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(value_name = "SRC", help = "Python package directory")]
    pub source: PathBuf,

    #[arg(value_name = "DEST", help = "Destination directory, replaced on every run")]
    pub destination: PathBuf,

    #[arg(
        short = 'a',
        long,
        help = "Compile every eligible module, ignoring opt-in markers"
    )]
    pub compile_all: bool,

    #[arg(
        short = 'c',
        long,
        help = "Remove native artifacts and C files from the source tree afterwards"
    )]
    pub clean: bool,

    #[arg(long, value_name = "FILE", help = "Path to a partcy.toml configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "PYTHON", help = "Python interpreter used to run Cython")]
    pub python: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    #[arg(value_name = "SRC", help = "Python package directory")]
    pub source: PathBuf,

    #[arg(
        short = 'a',
        long,
        help = "Compile every eligible module, ignoring opt-in markers"
    )]
    pub compile_all: bool,

    #[arg(long, value_name = "FILE", help = "Path to a partcy.toml configuration file")]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

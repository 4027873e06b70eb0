//! Configuration management for partcy
//!
//! Settings come from an optional TOML file, then environment variables,
//! then command-line flags (applied by the binary). Every key is optional.
//!
//! # TOML keys
//!
//! - `compile_all`: compile every eligible module, ignoring opt-in markers - default: `false`
//! - `clean`: remove build byproducts from the source tree afterwards - default: `false`
//! - `include_data`: glob patterns of non-Python files to ship - default: `[]`
//! - `always_exclude`: glob patterns of files to drop, highest precedence - default: `[]`
//! - `never_obfuscate`: glob patterns of modules always shipped as source - default: `[]`
//! - `aux_dirs`: directories beside the package copied wholesale - default: `["tests"]`
//! - `python`: interpreter used to run Cython - default: `"python3"`
//! - `ext_suffix`: native module suffix; queried from `python` when unset
//!
//! # Environment Variables
//!
//! - `PARTCY_PYTHON`: overrides `python`
//! - `PARTCY_EXT_SUFFIX`: overrides `ext_suffix`
//! - `PARTCY_LOG_LEVEL`: logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use partcy::PartcyConfig;
//! use std::path::Path;
//!
//! let config = PartcyConfig::load(Some(Path::new("partcy.toml"))).expect("config");
//! config.validate().expect("Invalid configuration");
//! ```

use crate::build::ArtifactSuffix;
use crate::classify::{ClassifierRules, PatternSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_PYTHON: &str = "python3";
const DEFAULT_AUX_DIR: &str = "tests";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid glob pattern '{pattern}' in {field}: {message}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        message: String,
    },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartcyConfig {
    pub compile_all: bool,
    pub clean: bool,
    pub include_data: Vec<String>,
    pub always_exclude: Vec<String>,
    pub never_obfuscate: Vec<String>,
    pub aux_dirs: Vec<String>,
    pub python: String,
    pub ext_suffix: Option<String>,
}

impl Default for PartcyConfig {
    fn default() -> Self {
        Self {
            compile_all: false,
            clean: false,
            include_data: Vec::new(),
            always_exclude: Vec::new(),
            never_obfuscate: Vec::new(),
            aux_dirs: vec![DEFAULT_AUX_DIR.to_string()],
            python: DEFAULT_PYTHON.to_string(),
            ext_suffix: None,
        }
    }
}

impl PartcyConfig {
    /// Parses a TOML document
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Loads the file if given (defaults otherwise) and applies environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if let Ok(python) = env::var("PARTCY_PYTHON") {
            if !python.trim().is_empty() {
                self.python = python;
            }
        }
        if let Ok(suffix) = env::var("PARTCY_EXT_SUFFIX") {
            if !suffix.trim().is_empty() {
                self.ext_suffix = Some(suffix);
            }
        }
    }

    /// Validates the configuration
    ///
    /// Checks that every pattern compiles, the interpreter is named, and an
    /// explicit extension suffix starts with a dot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.classifier_patterns()?;

        if self.python.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "python interpreter must not be empty".to_string(),
            ));
        }

        if let Some(suffix) = &self.ext_suffix {
            if !suffix.starts_with('.') || suffix.len() < 2 {
                return Err(ConfigError::ValidationFailed(format!(
                    "ext_suffix must start with '.', got '{}'",
                    suffix
                )));
            }
        }

        if let Some(bad) = self
            .aux_dirs
            .iter()
            .find(|d| d.is_empty() || Path::new(d).is_absolute() || d.contains(".."))
        {
            return Err(ConfigError::ValidationFailed(format!(
                "aux_dirs entries must be relative directory names, got '{}'",
                bad
            )));
        }

        Ok(())
    }

    /// Builds classification rules for the given platform suffix
    pub fn classifier_rules(&self, suffix: ArtifactSuffix) -> Result<ClassifierRules, ConfigError> {
        let (always_exclude, include_data, never_obfuscate) = self.classifier_patterns()?;
        Ok(ClassifierRules {
            always_exclude,
            include_data,
            never_obfuscate,
            artifact_suffix: suffix,
        })
    }

    fn classifier_patterns(&self) -> Result<(PatternSet, PatternSet, PatternSet), ConfigError> {
        Ok((
            compile_patterns("always_exclude", &self.always_exclude)?,
            compile_patterns("include_data", &self.include_data)?,
            compile_patterns("never_obfuscate", &self.never_obfuscate)?,
        ))
    }

    /// Converts configuration to a display map for output formatting
    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("compile_all".to_string(), self.compile_all.to_string());
        map.insert("clean".to_string(), self.clean.to_string());
        map.insert("include_data".to_string(), self.include_data.join(", "));
        map.insert("always_exclude".to_string(), self.always_exclude.join(", "));
        map.insert("never_obfuscate".to_string(), self.never_obfuscate.join(", "));
        map.insert("aux_dirs".to_string(), self.aux_dirs.join(", "));
        map.insert("python".to_string(), self.python.clone());
        if let Some(ref suffix) = self.ext_suffix {
            map.insert("ext_suffix".to_string(), suffix.clone());
        }
        map
    }
}

fn compile_patterns(field: &'static str, patterns: &[String]) -> Result<PatternSet, ConfigError> {
    PatternSet::new(patterns).map_err(|e| ConfigError::InvalidPattern {
        field,
        pattern: e.pattern,
        message: e.source.msg.to_string(),
    })
}

impl fmt::Display for PartcyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Partcy Configuration:")?;
        writeln!(f, "  Compile All: {}", self.compile_all)?;
        writeln!(f, "  Clean: {}", self.clean)?;
        writeln!(f, "  Include Data: {:?}", self.include_data)?;
        writeln!(f, "  Always Exclude: {:?}", self.always_exclude)?;
        writeln!(f, "  Never Obfuscate: {:?}", self.never_obfuscate)?;
        writeln!(f, "  Aux Dirs: {:?}", self.aux_dirs)?;
        writeln!(f, "  Python: {}", self.python)?;
        if let Some(ref suffix) = self.ext_suffix {
            writeln!(f, "  Ext Suffix: {}", suffix)?;
        }
        Ok(())
    }
}

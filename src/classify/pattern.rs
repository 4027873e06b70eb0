//! Glob matching over package-relative paths

use glob::{MatchOptions, Pattern, PatternError};
use std::path::Path;
use thiserror::Error;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, Error)]
#[error("invalid glob pattern '{pattern}': {source}")]
pub struct InvalidPattern {
    pub pattern: String,
    pub source: PatternError,
}

/// A compiled set of shell-style glob patterns.
///
/// Paths are compared with `/` as separator regardless of platform, and `*`
/// is allowed to cross directory boundaries, so `*.csv` matches
/// `pkg/data/info.csv`.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, InvalidPattern> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|source| InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if `relative_path` matches any pattern in the set
    pub fn matches(&self, relative_path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let normalized = normalize(relative_path);
        self.patterns
            .iter()
            .any(|p| p.matches_with(&normalized, MATCH_OPTIONS))
    }
}

/// Renders a relative path with forward slashes.
pub fn normalize(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

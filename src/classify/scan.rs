//! Content inspection for Python modules
//!
//! Two questions are asked of a module's text: does its first line opt it in
//! to native compilation, and does it depend on numba's JIT, which cannot
//! survive ahead-of-time compilation.

use serde::Serialize;
use std::borrow::Cow;

/// First-line token that selects a module for compilation in selective mode
pub const OPT_IN_MARKER: &str = "# obfuscate_with_cython: True";

const RUNTIME_ANNOTATION_IMPORTS: &[&str] = &["import numba", "from numba"];

/// Compilation opt-in state parsed from a module's leading line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileMarker {
    #[default]
    NotMarked,
    ForceCompile,
}

impl CompileMarker {
    pub fn parse(content: &str) -> Self {
        let first_line = content.lines().next().unwrap_or("");
        let first_line = first_line.strip_prefix('\u{feff}').unwrap_or(first_line);
        if first_line.starts_with(OPT_IN_MARKER) {
            CompileMarker::ForceCompile
        } else {
            CompileMarker::NotMarked
        }
    }

    pub fn is_forced(self) -> bool {
        self == CompileMarker::ForceCompile
    }
}

/// Decodes module bytes as UTF-8, substituting replacement characters for
/// invalid sequences instead of failing.
pub fn decode_lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Returns true if the module imports numba anywhere in its text
pub fn uses_runtime_annotation(content: &str) -> bool {
    RUNTIME_ANNOTATION_IMPORTS
        .iter()
        .any(|needle| content.contains(needle))
}

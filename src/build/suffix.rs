use serde::Serialize;
use std::fmt;

/// Filename suffix of native extension modules on the host, e.g.
/// `.cpython-311-x86_64-linux-gnu.so`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArtifactSuffix(String);

impl ArtifactSuffix {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self(suffix.into())
    }

    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::new(".pyd")
        } else {
            Self::new(".so")
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final extension of the suffix (`.so` for `.cpython-311-x86_64-linux-gnu.so`)
    pub fn extension(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[idx..],
            None => &self.0,
        }
    }

    /// True for any compiled extension module, whichever interpreter built it
    pub fn is_artifact(&self, file_name: &str) -> bool {
        file_name.ends_with(self.extension())
    }

    pub fn artifact_name(&self, stem: &str) -> String {
        format!("{}{}", stem, self.0)
    }

    /// Whether `file_name` is a native artifact built from a module named `stem`.
    ///
    /// Besides the exact host name this accepts `<stem><ext>` and
    /// `<stem>.<tag><ext>` where the tag holds no further dots.
    pub fn matches_artifact(&self, stem: &str, file_name: &str) -> bool {
        if file_name == self.artifact_name(stem) {
            return true;
        }
        let Some(tag) = file_name
            .strip_prefix(stem)
            .and_then(|rest| rest.strip_suffix(self.extension()))
        else {
            return false;
        };
        match tag.strip_prefix('.') {
            Some(tag) => !tag.is_empty() && !tag.contains('.'),
            None => tag.is_empty(),
        }
    }
}

impl fmt::Display for ArtifactSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

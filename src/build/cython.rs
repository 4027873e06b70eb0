//! Cython build through the generated setuptools script

use super::{ArtifactSuffix, BuildError, BuildInvocation, BuildOutcome};
use crate::manifest::{WrittenManifest, BUILD_SCRIPT_FILE_NAME};
use std::process::Command;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const EXT_SUFFIX_QUERY: &str = "import sysconfig; print(sysconfig.get_config_var('EXT_SUFFIX') or '')";

/// Runs `<python> setup_generated.py build_ext --inplace` in the project root
#[derive(Debug, Clone)]
pub struct CythonBuild {
    python: String,
}

impl CythonBuild {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    pub fn python(&self) -> &str {
        &self.python
    }

    /// Asks the interpreter for its extension-module suffix
    pub fn query_ext_suffix(&self) -> Option<ArtifactSuffix> {
        let output = match Command::new(&self.python)
            .arg("-c")
            .arg(EXT_SUFFIX_QUERY)
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!(python = %self.python, error = %e, "Could not run interpreter to query EXT_SUFFIX");
                return None;
            }
        };

        if !output.status.success() {
            warn!(python = %self.python, status = %output.status, "EXT_SUFFIX query failed");
            return None;
        }

        let suffix = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if suffix.starts_with('.') {
            debug!(suffix = %suffix, "Resolved extension suffix from interpreter");
            Some(ArtifactSuffix::new(suffix))
        } else {
            None
        }
    }

    /// Suffix reported by the interpreter, or the platform default
    pub fn resolve_ext_suffix(&self) -> ArtifactSuffix {
        self.query_ext_suffix().unwrap_or_else(|| {
            let fallback = ArtifactSuffix::platform_default();
            warn!(suffix = %fallback, "Falling back to platform default extension suffix");
            fallback
        })
    }
}

impl Default for CythonBuild {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl BuildInvocation for CythonBuild {
    fn name(&self) -> &str {
        "cython"
    }

    fn compile(&self, manifest: &WrittenManifest) -> Result<BuildOutcome, BuildError> {
        let start = Instant::now();
        info!(
            python = %self.python,
            modules = manifest.entries().len(),
            cwd = %manifest.project_root.display(),
            "Running cython on selected files"
        );

        let output = Command::new(&self.python)
            .arg(BUILD_SCRIPT_FILE_NAME)
            .arg("build_ext")
            .arg("--inplace")
            .current_dir(&manifest.project_root)
            .output()
            .map_err(|source| BuildError::Spawn {
                program: self.python.clone(),
                source,
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(target: "partcy::build::output", "{}", line);
        }

        if !output.status.success() {
            for line in String::from_utf8_lossy(&output.stderr).lines() {
                error!(target: "partcy::build::output", "{}", line);
            }
            return Err(BuildError::Failed {
                code: output.status.code(),
            });
        }

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!(target: "partcy::build::output", "{}", line);
        }

        Ok(BuildOutcome {
            tool: self.name().to_string(),
            modules: manifest.entries().len(),
            duration: start.elapsed(),
        })
    }
}

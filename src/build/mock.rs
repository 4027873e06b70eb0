use super::{ArtifactSuffix, BuildError, BuildInvocation, BuildOutcome};
use crate::manifest::WrittenManifest;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

/// Scripted behavior for [`MockBuild`]
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Produce an artifact (and a C translation file) for every entry
    Succeed,
    /// Produce artifacts for every entry except the listed ones
    Skip(Vec<PathBuf>),
    /// Produce nothing and report a failure
    Fail(String),
}

/// Build double that fabricates artifacts beside each manifest entry
pub struct MockBuild {
    suffix: ArtifactSuffix,
    behavior: MockBehavior,
    calls: Mutex<Vec<Vec<PathBuf>>>,
}

impl MockBuild {
    pub fn new(suffix: ArtifactSuffix) -> Self {
        Self::with_behavior(suffix, MockBehavior::Succeed)
    }

    pub fn with_behavior(suffix: ArtifactSuffix, behavior: MockBehavior) -> Self {
        Self {
            suffix,
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Manifests received so far, one entry per `compile` call
    pub fn calls(&self) -> Vec<Vec<PathBuf>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Contents written into a fabricated artifact for `module`
    pub fn artifact_contents(module: &Path) -> String {
        format!("native:{}", module.display())
    }

    fn fabricate(&self, project_root: &Path, module: &Path) -> Result<(), BuildError> {
        let source = project_root.join(module);
        let stem = module
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| BuildError::Other(format!("module without stem: {}", module.display())))?;
        let dir = source.parent().unwrap_or(project_root);

        let artifact = dir.join(self.suffix.artifact_name(stem));
        fs::write(&artifact, Self::artifact_contents(module))
            .map_err(|e| BuildError::Other(format!("{}: {}", artifact.display(), e)))?;

        let translation = dir.join(format!("{}.c", stem));
        fs::write(&translation, "/* generated */\n")
            .map_err(|e| BuildError::Other(format!("{}: {}", translation.display(), e)))?;
        Ok(())
    }
}

impl BuildInvocation for MockBuild {
    fn name(&self) -> &str {
        "mock"
    }

    fn compile(&self, manifest: &WrittenManifest) -> Result<BuildOutcome, BuildError> {
        let start = Instant::now();
        self.calls
            .lock()
            .unwrap()
            .push(manifest.entries().to_vec());

        let skipped: &[PathBuf] = match &self.behavior {
            MockBehavior::Fail(message) => return Err(BuildError::Other(message.clone())),
            MockBehavior::Skip(skipped) => skipped,
            MockBehavior::Succeed => &[],
        };

        for module in manifest.entries() {
            if skipped.contains(module) {
                continue;
            }
            self.fabricate(&manifest.project_root, module)?;
        }

        Ok(BuildOutcome {
            tool: self.name().to_string(),
            modules: manifest.entries().len(),
            duration: start.elapsed(),
        })
    }
}

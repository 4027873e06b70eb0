use crate::build::ArtifactSuffix;
use crate::classify::ClassifierRules;
use crate::config::{ConfigError, PartcyConfig};
use crate::manifest::SelectionStrategy;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub strategy: SelectionStrategy,
    pub clean: bool,
    pub rules: ClassifierRules,
    /// Directories beside the package copied wholesale into the destination
    pub aux_dirs: Vec<String>,
}

impl PipelineOptions {
    pub fn new(rules: ClassifierRules) -> Self {
        Self {
            strategy: SelectionStrategy::default(),
            clean: false,
            rules,
            aux_dirs: vec!["tests".to_string()],
        }
    }

    pub fn from_config(config: &PartcyConfig, suffix: ArtifactSuffix) -> Result<Self, ConfigError> {
        Ok(Self {
            strategy: SelectionStrategy::from_compile_all(config.compile_all),
            clean: config.clean,
            rules: config.classifier_rules(suffix)?,
            aux_dirs: config.aux_dirs.clone(),
        })
    }

    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_aux_dirs(mut self, aux_dirs: Vec<String>) -> Self {
        self.aux_dirs = aux_dirs;
        self
    }

    pub fn suffix(&self) -> &ArtifactSuffix {
        &self.rules.artifact_suffix
    }
}

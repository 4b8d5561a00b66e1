//! Analysis settings read from an optional TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use commlens_stats::{BootstrapOptions, CorrelationMethod};
use commlens_transform::language::ENGLISH_LABEL;
use commlens_transform::{FilterOptions, NormalizeOptions, PipelineOptions};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Servers whose rules must each be classified English.
    pub override_servers: Vec<usize>,
    /// Classifier label that means English.
    pub english_label: String,
    pub correlation_method: CorrelationMethod,
    pub bootstrap_iterations: usize,
    pub seed: u64,
    /// Drop platform-specific columns after normalization.
    pub keep_common_only: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let bootstrap = BootstrapOptions::default();
        Self {
            override_servers: Vec::new(),
            english_label: ENGLISH_LABEL.to_string(),
            correlation_method: CorrelationMethod::Spearman,
            bootstrap_iterations: bootstrap.n_iterations,
            seed: bootstrap.seed,
            keep_common_only: false,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("parse analysis config")
    }

    /// Reads `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config =
            Self::from_toml(&content).with_context(|| format!("in {}", path.display()))?;
        info!(path = %path.display(), "loaded analysis config");
        Ok(config)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            keep_common_only: self.keep_common_only,
        }
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            override_servers: self.override_servers.iter().copied().collect(),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            filter: self.filter_options(),
            english_label: self.english_label.clone(),
        }
    }

    /// Bootstrap settings. The bootstrap only takes rank correlations, so
    /// a configured pearson falls back to spearman.
    pub fn bootstrap_options(&self) -> BootstrapOptions {
        let method = match self.correlation_method {
            CorrelationMethod::Pearson => CorrelationMethod::Spearman,
            other => other,
        };
        BootstrapOptions {
            method,
            n_iterations: self.bootstrap_iterations,
            seed: self.seed,
        }
    }

    /// Fisher comparison method; kendall falls back to spearman.
    pub fn fisher_method(&self) -> CorrelationMethod {
        match self.correlation_method {
            CorrelationMethod::Kendall => CorrelationMethod::Spearman,
            other => other,
        }
    }
}

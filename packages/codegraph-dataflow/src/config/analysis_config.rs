//! Analysis driver configuration
//!
//! One struct covers a whole batch: which analyses to run, where the
//! program starts, what to export and where.

use super::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound on configured entry points
const MAX_ENTRY_POINTS: usize = 64;

/// Configuration for one analysis batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Analyses to run, by name (see `AnalysisKind`)
    pub analyses: Vec<String>,

    /// Functions whose entries are seeded (1..=64)
    pub entry_points: Vec<String>,

    /// Function analysed by the intraprocedural monotone solver test
    pub intra_function: String,

    /// Whole-program mode; module-wise mode is reported and falls back
    pub whole_program: bool,

    /// Record every exploded edge the IFDS/IDE solvers compute
    pub record_edges: bool,

    /// Run independent analyses on the rayon pool
    pub parallel_analyses: bool,

    /// Write JSON result records
    pub export_json: bool,

    /// Write DOT graphs (ICFG, call graph, recorded exploded edges)
    pub export_dot: bool,

    /// Directory for exports; nothing is written when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Functions summarized as identity instead of being analysed
    pub identity_summaries: Vec<String>,

    /// Functions summarized as killing every incoming fact
    pub kill_summaries: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analyses: Vec::new(),
            entry_points: vec!["main".to_string()],
            intra_function: "main".to_string(),
            whole_program: true,
            record_edges: false,
            parallel_analyses: false,
            export_json: true,
            export_dot: false,
            output_dir: None,
            identity_summaries: Vec::new(),
            kill_summaries: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Builder-style analysis selection
    pub fn with_analyses<I, S>(mut self, analyses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.analyses = analyses.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.entry_points.is_empty() || self.entry_points.len() > MAX_ENTRY_POINTS {
            return Err(ConfigError::range_with_hint(
                "entry_points",
                self.entry_points.len(),
                1,
                MAX_ENTRY_POINTS,
                "At least one entry function must be seeded",
            ));
        }

        if self.entry_points.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "entry_points must not contain empty names".to_string(),
            ));
        }

        if self.intra_function.trim().is_empty() {
            return Err(ConfigError::Validation(
                "intra_function must name a function".to_string(),
            ));
        }

        if let Some(name) = self
            .identity_summaries
            .iter()
            .find(|name| self.kill_summaries.contains(name))
        {
            return Err(ConfigError::Validation(format!(
                "'{}' cannot have both an identity and a kill summary",
                name
            )));
        }

        if (self.export_json || self.export_dot) && self.output_dir.is_none() {
            tracing::debug!("exports enabled without output_dir; nothing will be written");
        }

        Ok(())
    }

    /// Load and validate a YAML configuration file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

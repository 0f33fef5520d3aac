//! Analysis run report
//!
//! ```text
//! AnalysisReport
//! ├── program: String
//! ├── outcomes: Vec<AnalysisOutcome>   (one per analysis that ran)
//! │   ├── records         (point/fact/value table as JSON)
//! │   ├── findings
//! │   ├── statistics      (solver counters as JSON)
//! │   └── exploded_edges  (only with record_edges)
//! └── diagnostics: Vec<Diagnostic>
//! ```

use serde::{Deserialize, Serialize};

use super::analysis_kind::{AnalysisKind, SolverKind};
use crate::features::analyses::Finding;
use crate::features::ifds::ExplodedEdgeRecord;
use crate::shared::{Diagnostic, Severity};

/// Result of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub analysis: AnalysisKind,
    pub solver: SolverKind,
    pub records: serde_json::Value,
    pub findings: Vec<Finding>,
    pub statistics: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exploded_edges: Vec<ExplodedEdgeRecord>,
}

impl AnalysisOutcome {
    pub fn new(analysis: AnalysisKind) -> Self {
        Self {
            analysis,
            solver: analysis.solver_kind(),
            records: serde_json::Value::Array(Vec::new()),
            findings: Vec::new(),
            statistics: serde_json::Value::Null,
            exploded_edges: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub program: String,
    pub outcomes: Vec<AnalysisOutcome>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    pub fn outcome(&self, analysis: AnalysisKind) -> Option<&AnalysisOutcome> {
        self.outcomes.iter().find(|o| o.analysis == analysis)
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.outcomes.iter().flat_map(|o| o.findings.iter())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

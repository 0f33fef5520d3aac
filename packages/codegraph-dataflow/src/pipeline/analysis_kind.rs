//! Analysis selection
//!
//! Closed set of analyses the controller knows how to run, addressed by
//! their kebab-case names in configuration and on the command line.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DataflowError;

/// Selectable analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    #[serde(rename = "ifds-uninit")]
    IfdsUninitializedVariables,
    IfdsTaint,
    IdeTaint,
    IfdsType,
    #[serde(rename = "ifds-solvertest")]
    IfdsSolverTest,
    #[serde(rename = "ide-solvertest")]
    IdeSolverTest,
    #[serde(rename = "mono-intra-solvertest")]
    MonoIntraSolverTest,
    #[serde(rename = "mono-inter-solvertest")]
    MonoInterSolverTest,
    /// Build and export the ICFG only
    None,
}

/// Solver family an analysis runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverKind {
    Ifds,
    Ide,
    MonoIntra,
    MonoInter,
    None,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 9] = [
        AnalysisKind::IfdsUninitializedVariables,
        AnalysisKind::IfdsTaint,
        AnalysisKind::IdeTaint,
        AnalysisKind::IfdsType,
        AnalysisKind::IfdsSolverTest,
        AnalysisKind::IdeSolverTest,
        AnalysisKind::MonoIntraSolverTest,
        AnalysisKind::MonoInterSolverTest,
        AnalysisKind::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::IfdsUninitializedVariables => "ifds-uninit",
            AnalysisKind::IfdsTaint => "ifds-taint",
            AnalysisKind::IdeTaint => "ide-taint",
            AnalysisKind::IfdsType => "ifds-type",
            AnalysisKind::IfdsSolverTest => "ifds-solvertest",
            AnalysisKind::IdeSolverTest => "ide-solvertest",
            AnalysisKind::MonoIntraSolverTest => "mono-intra-solvertest",
            AnalysisKind::MonoInterSolverTest => "mono-inter-solvertest",
            AnalysisKind::None => "none",
        }
    }

    pub fn solver_kind(&self) -> SolverKind {
        match self {
            AnalysisKind::IfdsUninitializedVariables
            | AnalysisKind::IfdsTaint
            | AnalysisKind::IfdsType
            | AnalysisKind::IfdsSolverTest => SolverKind::Ifds,
            AnalysisKind::IdeTaint | AnalysisKind::IdeSolverTest => SolverKind::Ide,
            AnalysisKind::MonoIntraSolverTest => SolverKind::MonoIntra,
            AnalysisKind::MonoInterSolverTest => SolverKind::MonoInter,
            AnalysisKind::None => SolverKind::None,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AnalysisKind {
    type Err = DataflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        AnalysisKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| DataflowError::UnknownAnalysis(s.to_string()))
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolverKind::Ifds => "ifds",
            SolverKind::Ide => "ide",
            SolverKind::MonoIntra => "mono-intra",
            SolverKind::MonoInter => "mono-inter",
            SolverKind::None => "none",
        };
        write!(f, "{}", name)
    }
}

//! Analysis selection and orchestration

pub mod analysis_kind;
pub mod controller;
pub mod report;

pub use analysis_kind::{AnalysisKind, SolverKind};
pub use controller::AnalysisController;
pub use report::{AnalysisOutcome, AnalysisReport};

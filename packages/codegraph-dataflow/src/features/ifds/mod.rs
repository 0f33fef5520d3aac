//! IFDS: problem traits, tabulation solver and result table

pub mod edge_recorder;
pub mod problem;
pub mod results;
pub mod solver;
pub mod special_summaries;

pub use edge_recorder::{EdgeRecorder, ExplodedEdgeRecord};
pub use problem::{
    lambda_flow, DataflowFact, FlowFn, FlowFunction, GenFlowFunction, IdentityFlowFunction,
    IfdsProblem, KillFlowFunction, LambdaFlowFunction,
};
pub use results::{IfdsRecord, IfdsResults, IfdsStatistics, SummaryEdge};
pub use solver::IfdsSolver;
pub use special_summaries::SpecialSummaries;

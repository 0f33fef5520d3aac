//! IDE: edge functions, jump functions, solver and lazily evaluated results

pub mod edge_function;
pub mod jump_functions;
pub mod problem;
pub mod results;
pub mod solver;

pub use edge_function::{EdgeFn, EdgeFunction};
pub use jump_functions::JumpFunctions;
pub use problem::{IdeProblem, IdeValues};
pub use results::{IdeRecord, IdeResults, IdeStatistics};
pub use solver::IdeSolver;

//! Monotone framework: per-point lattice values, intra- and interprocedural

pub mod inter_solver;
pub mod intra_solver;
pub mod problem;
pub mod results;

pub use inter_solver::InterMonotoneSolver;
pub use intra_solver::IntraMonotoneSolver;
pub use problem::{InterMonotoneProblem, IntraMonotoneProblem};
pub use results::{MonotoneRecord, MonotoneResults, MonotoneStatistics};

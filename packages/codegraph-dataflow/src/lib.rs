/*
 * Codegraph Dataflow - IFDS/IDE and Monotone Solvers
 *
 * Feature-First layout:
 * - shared/   : interning, diagnostics
 * - config/   : analysis configuration (YAML)
 * - features/ : IR, supergraph, lattices, solvers, analyses, export
 * - pipeline/ : analysis selection and controller
 *
 * All solvers consume the supergraph through the `Icfg` trait and work on
 * problems defined through traits; the exploded supergraph is never built.
 */

#![allow(clippy::type_complexity)] // Solver tables are nested maps
#![allow(clippy::too_many_arguments)] // Return-flow signatures

/// Shared utilities
pub mod shared;

/// Feature modules
pub mod features;

/// Analysis selection and orchestration
pub mod pipeline;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::AnalysisConfig;
pub use errors::{DataflowError, Result};
pub use features::ide::{EdgeFn, EdgeFunction, IdeProblem, IdeResults, IdeSolver, IdeValues};
pub use features::ifds::{DataflowFact, FlowFunction, IfdsProblem, IfdsResults, IfdsSolver};
pub use features::ir::Program;
pub use features::lattice::{BoundedLattice, Lattice};
pub use features::monotone::{
    InterMonotoneProblem, InterMonotoneSolver, IntraMonotoneProblem, IntraMonotoneSolver,
};
pub use features::supergraph::{Icfg, ProgramIcfg};
pub use pipeline::{AnalysisController, AnalysisKind, AnalysisReport, SolverKind};

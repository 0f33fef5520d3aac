//! Feature modules
//!
//! - ir/         : input program model and structural verifier
//! - supergraph/ : ICFG abstraction and its adapter over the IR
//! - lattice/    : value domains
//! - ifds/       : IFDS problems and tabulation solver
//! - ide/        : IDE edge functions and solver
//! - monotone/   : intra- and interprocedural monotone framework
//! - analyses/   : built-in analyses and their findings
//! - export/     : JSON and DOT writers

pub mod analyses;
pub mod export;
pub mod ide;
pub mod ifds;
pub mod ir;
pub mod lattice;
pub mod monotone;
pub mod supergraph;

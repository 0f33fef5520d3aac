//! Common test utilities for codegraph-dataflow
//!
//! Program builders, small fixture problems over [`ProgramIcfg`] and
//! assertions on result tables.
//!
//! [`ProgramIcfg`]: codegraph_dataflow::features::supergraph::ProgramIcfg

#![allow(dead_code)]

mod assertions;
mod builders;
mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;

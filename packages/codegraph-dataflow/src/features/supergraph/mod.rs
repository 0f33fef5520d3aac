//! Supergraph (ICFG) abstraction and the adapter over the bundled IR

pub mod icfg;
pub mod program_icfg;

pub use icfg::{EdgeKind, Icfg};
pub use program_icfg::{FunctionId, FunctionInfo, NodeInfo, PointId, ProgramIcfg};

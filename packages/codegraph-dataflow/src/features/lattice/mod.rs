//! Lattice/domain primitives shared by the IDE and monotone solvers

pub mod domain;
pub mod values;

pub use domain::{BoundedLattice, Lattice};
pub use values::{BinaryDomain, ConstantLattice, MinValue, SetLattice};
